// build.rs

use clap::{Arg, ArgAction, Command};
use clap_mangen::Man;
use std::env;
use std::fs;
use std::path::PathBuf;

fn url_arg() -> Arg {
    Arg::new("url").required(true).help("Repository base URL")
}

fn package_arg() -> Arg {
    Arg::new("package")
        .required(true)
        .help("Package identifier (the Package field)")
}

fn build_cli() -> Command {
    Command::new("cyweb")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Cyweb Contributors")
        .about("Browse and search APT-style (Cydia/Sileo) repositories")
        .subcommand_required(false)
        .arg(
            Arg::new("db_path")
                .short('d')
                .long("db-path")
                .value_name("PATH")
                .default_value("cyweb.db")
                .global(true)
                .help("Database path"),
        )
        .arg(
            Arg::new("timeout")
                .short('t')
                .long("timeout")
                .value_name("SECONDS")
                .default_value("30")
                .global(true)
                .help("HTTP timeout in seconds"),
        )
        .subcommand(Command::new("init").about("Initialize the Cyweb database"))
        .subcommand(
            Command::new("repo-add")
                .about("Register a repository")
                .arg(url_arg())
                .arg(
                    Arg::new("name")
                        .short('n')
                        .long("name")
                        .help("Display name (defaults to the URL)"),
                )
                .arg(Arg::new("icon").long("icon").help("Icon URL"))
                .arg(
                    Arg::new("compat")
                        .long("compat")
                        .help("Compatibility note, e.g. \"iOS 14+\""),
                ),
        )
        .subcommand(
            Command::new("repo-remove")
                .about("Unregister a repository")
                .arg(url_arg()),
        )
        .subcommand(Command::new("repo-list").about("List registered repositories"))
        .subcommand(
            Command::new("repo-samples")
                .about("Register the sample repositories (Havoc, Chariz, Procursus)"),
        )
        .subcommand(
            Command::new("repo-create")
                .about("Describe a repository of your own and register it")
                .arg(Arg::new("name").long("name").required(true))
                .arg(Arg::new("url").long("url").required(true))
                .arg(Arg::new("icon").long("icon").help("Icon URL"))
                .arg(
                    Arg::new("compat")
                        .long("compat")
                        .help("Compatibility note, e.g. \"iOS 14+\""),
                ),
        )
        .subcommand(
            Command::new("repo-created").about("List repositories created with repo-create"),
        )
        .subcommand(
            Command::new("fetch")
                .about("Fetch a repository's package index")
                .arg(url_arg()),
        )
        .subcommand(Command::new("refresh").about("Fetch every registered repository"))
        .subcommand(
            Command::new("list")
                .about("List the packages of a repository")
                .arg(url_arg()),
        )
        .subcommand(
            Command::new("search")
                .about("Search all registered repositories by package, name or maintainer")
                .arg(Arg::new("query").required(true)),
        )
        .subcommand(
            Command::new("show")
                .about("Show details of a package")
                .arg(url_arg())
                .arg(package_arg())
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Print the record as JSON"),
                ),
        )
        .subcommand(
            Command::new("install")
                .about("Simulate installing a package (nothing is downloaded)")
                .arg(url_arg())
                .arg(package_arg()),
        )
        .subcommand(
            Command::new("completions")
                .about("Generate shell completions")
                .arg(Arg::new("shell").required(true)),
        )
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    // Create man directory
    let out_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap());
    let man_dir = out_dir.join("man");
    fs::create_dir_all(&man_dir).expect("Failed to create man directory");

    // Generate main man page
    let cmd = build_cli();
    let man = Man::new(cmd);
    let mut buffer = Vec::new();
    man.render(&mut buffer).expect("Failed to render man page");

    let man_path = man_dir.join("cyweb.1");
    fs::write(&man_path, buffer).expect("Failed to write man page");
}
