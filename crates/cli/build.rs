use std::{env, fs, path::PathBuf};

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=OUT_DIR");

    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let completions_dir = out_dir.join("completions");

    fs::create_dir_all(&completions_dir).unwrap();

    let mut cmd = clap::Command::new("sectio")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Sectio Contributors")
        .about("Render wiki articles as mobile-sections JSON")
        .arg(clap::arg!(<INPUT> "Page title with --domain, otherwise a local Parsoid HTML file or '-' for stdin"))
        .arg(clap::arg!(-d --domain <DOMAIN> "Wiki domain to fetch from (e.g. en.wikipedia.org)"))
        .arg(
            clap::arg!(-r --revision <REV> "Revision to render (live mode only)")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            clap::arg!(--meta <FILE> "Page metadata JSON for offline input")
                .value_parser(clap::value_parser!(std::path::PathBuf)),
        )
        .arg(clap::arg!(--title <TITLE> "Page title for offline input (default: the document <title>)"))
        .arg(
            clap::arg!(-e --endpoint <ENDPOINT> "Response to render")
                .default_value("mobile-sections")
                .value_parser([
                    "mobile-sections",
                    "mobile-sections-lead",
                    "mobile-sections-remaining",
                    "mobile-sections-references",
                    "formatted",
                    "formatted-lead",
                ]),
        )
        .arg(clap::arg!(--split_depth <LEVEL> "Deepest heading level that starts a section").default_value("6"))
        .arg(clap::arg!(-p --pretty "Pretty-print the JSON output"))
        .arg(
            clap::arg!(-o --output <FILE> "Output file (default: stdout)")
                .value_name("FILE")
                .value_parser(clap::value_parser!(std::path::PathBuf)),
        )
        .arg(clap::arg!(--timeout <SECS> "HTTP timeout in seconds").default_value("30"))
        .arg(clap::arg!(--user_agent <UA> "Custom User-Agent for HTTP requests").value_name("UA"))
        .arg(clap::arg!(-v --verbose "Print progress and a section outline to stderr"));

    clap_complete::generate_to(clap_complete::shells::Bash, &mut cmd, "sectio", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::Zsh, &mut cmd, "sectio", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::Fish, &mut cmd, "sectio", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::PowerShell, &mut cmd, "sectio", &completions_dir).unwrap();

    println!(
        "cargo:warning=Shell completions generated in: {}",
        completions_dir.display()
    );
}
