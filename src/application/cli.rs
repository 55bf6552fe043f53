use std::io;
use std::path;

use anyhow::bail;
use anyhow::Result;
use clap::value_parser;
use clap::Arg;
use clap::ArgAction;
use clap::ArgMatches;
use clap::Command;
use clap_complete::generate;
use clap_complete::Generator;
use clap_complete::Shell;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use yansi::Paint;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::ManifestLoader;
use crate::domain::services::actions::extract_all;
use crate::domain::services::actions::help_text;
use crate::domain::services::actions::read_local_files;
use crate::infrastructure::assets::manifest::AssetManifest;
use crate::infrastructure::extractors::ExtractorManager;

/// What the chat UI should load as soon as it starts.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChatOptions {
    pub files: Vec<String>,
    pub set: Option<String>,
}

impl ChatOptions {
    fn from_matches(matches: &ArgMatches) -> ChatOptions {
        let files = matches
            .try_get_many::<String>("files")
            .ok()
            .flatten()
            .map(|values| return values.cloned().collect::<Vec<String>>())
            .unwrap_or_default();

        let set = matches
            .try_get_one::<String>("set")
            .ok()
            .flatten()
            .map(|set| return set.to_string());

        return ChatOptions { files, set };
    }
}

fn print_completions<G: Generator>(gen: G, cmd: &mut Command) {
    generate(gen, cmd, cmd.get_name().to_string(), &mut io::stdout());
    std::process::exit(0);
}

async fn create_config_file() -> Result<()> {
    let config_file_path_str = Config::default(ConfigKey::ConfigFile);
    let config_file_path = path::PathBuf::from(&config_file_path_str);
    if config_file_path.exists() {
        bail!(format!(
            "Config file already exists at {config_file_path_str}"
        ));
    }

    if let Some(parent) = config_file_path.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent).await?;
        }
    }

    let mut file = fs::File::create(config_file_path.clone()).await?;
    file.write_all(Config::serialize_default(build()).as_bytes())
        .await?;

    println!("Created default config file at {config_file_path_str}");
    return Ok(());
}

async fn print_sets_list() -> Result<()> {
    let manifest = AssetManifest::from_config()?.load().await;
    let manifest = match manifest {
        Ok(manifest) => manifest,
        Err(err) => bail!(format!("Could not load document sets: {err}")),
    };

    if manifest.is_empty() {
        println!("There are no document sets in metadata.json.");
        return Ok(());
    }

    let sets = manifest
        .sets()
        .iter()
        .enumerate()
        .map(|(idx, set)| {
            let n = idx + 1;
            let mut res = format!("- ({n}) {} [{}]", set.display_name(), set.id);
            for file in &set.files {
                res = format!("{res}\n    {file}");
            }
            return res;
        })
        .collect::<Vec<String>>();

    println!("{}", sets.join("\n"));
    return Ok(());
}

async fn print_extracted_text(paths: Vec<String>) -> Result<()> {
    let files = read_local_files(&paths).await?;
    let text = extract_all(ExtractorManager::get(), files).await?;
    println!("{text}");
    return Ok(());
}

fn subcommand_completions() -> Command {
    return Command::new("completions")
        .about("Generates shell completions.")
        .arg(
            clap::Arg::new("shell")
                .short('s')
                .long("shell")
                .help("Which shell to generate completions for.")
                .action(ArgAction::Set)
                .value_parser(value_parser!(Shell))
                .required(true),
        );
}

fn subcommand_config() -> Command {
    return Command::new("config")
        .about("Configuration file options.")
        .subcommand(
            Command::new("create").about("Saves the default config file to the configuration file path. This command will fail if the file exists already.")
        )
        .subcommand(
            Command::new("default").about("Outputs the default configuration file to stdout.")
        )
        .subcommand(
            Command::new("path").about("Returns the default path for the configuration file.")
        );
}

fn subcommand_sets() -> Command {
    return Command::new("sets")
        .about("Predefined document sets from metadata.json under the asset root.")
        .arg_required_else_help(true)
        .subcommand(
            Command::new("list").about("List every document set with its id and files."),
        );
}

fn subcommand_extract() -> Command {
    return Command::new("extract")
        .about("Prints the text Docchat extracts from one or more PDF files, joined the way it is sent to the model.")
        .arg(
            Arg::new("files")
                .help("PDF files to extract.")
                .num_args(1..)
                .required(true),
        );
}

fn arg_files() -> Arg {
    return Arg::new("files")
        .help("PDF files to load as soon as the chat starts.")
        .num_args(0..);
}

fn arg_set() -> Arg {
    return Arg::new("set")
        .short('s')
        .long("set")
        .num_args(1)
        .help("Id or index of a predefined document set to load as soon as the chat starts.")
        .conflicts_with("files");
}

fn subcommand_chat() -> Command {
    return Command::new("chat")
        .about("Start a new chat about your documents.")
        .arg(arg_files())
        .arg(arg_set());
}

pub fn build() -> Command {
    let commands_text = help_text()
        .split('\n')
        .map(|line| {
            if line.starts_with('-') {
                return format!("  {line}");
            }
            if line.starts_with("COMMANDS:") || line.starts_with("HOTKEYS:") {
                return Paint::new(format!("CHAT {line}"))
                    .underline()
                    .bold()
                    .to_string();
            }
            return line.to_string();
        })
        .collect::<Vec<String>>()
        .join("\n");

    let about = format!(
        "{}\n\nVersion: {}\nCommit: {}",
        env!("CARGO_PKG_DESCRIPTION"),
        env!("CARGO_PKG_VERSION"),
        env!("VERGEN_GIT_DESCRIBE")
    );

    return Command::new("docchat")
        .about(about)
        .author(env!("CARGO_PKG_AUTHORS"))
        .version(env!("CARGO_PKG_VERSION"))
        .after_help(commands_text)
        .arg_required_else_help(false)
        .args_conflicts_with_subcommands(true)
        .subcommand(subcommand_chat())
        .subcommand(subcommand_completions())
        .subcommand(subcommand_config())
        .subcommand(subcommand_extract())
        .subcommand(subcommand_sets())
        .arg(arg_files())
        .arg(arg_set())
        .arg(
            Arg::new(ConfigKey::ConfigFile.to_string())
                .short('c')
                .long(ConfigKey::ConfigFile.to_string())
                .env("DOCCHAT_CONFIG_FILE")
                .num_args(1)
                .help(format!("Path to configuration file [default: {}]", Config::default(ConfigKey::ConfigFile)))
                .global(true)
        )
        .arg(
            Arg::new(ConfigKey::AssetRoot.to_string())
                .long(ConfigKey::AssetRoot.to_string())
                .env("DOCCHAT_ASSET_ROOT")
                .num_args(1)
                .help(format!("Base URL or local directory serving metadata.json and the document sets it lists. [default: {}]", Config::default(ConfigKey::AssetRoot)))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::GeminiToken.to_string())
                .long(ConfigKey::GeminiToken.to_string())
                .env("DOCCHAT_GEMINI_TOKEN")
                .num_args(1)
                .help("Google Gemini API token.")
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::GeminiURL.to_string())
                .long(ConfigKey::GeminiURL.to_string())
                .env("DOCCHAT_GEMINI_URL")
                .num_args(1)
                .help(format!("Google Gemini API URL. Can be swapped to a compatible proxy. [default: {}]", Config::default(ConfigKey::GeminiURL)))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::Model.to_string())
                .short('m')
                .long(ConfigKey::Model.to_string())
                .env("DOCCHAT_MODEL")
                .num_args(1)
                .help(format!("The Gemini model answering questions. [default: {}]", Config::default(ConfigKey::Model)))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::RequestTimeout.to_string())
                .long(ConfigKey::RequestTimeout.to_string())
                .env("DOCCHAT_REQUEST_TIMEOUT")
                .num_args(1)
                .help(format!("Time to wait in milliseconds for the model check and manifest requests. [default: {}]", Config::default(ConfigKey::RequestTimeout)))
                .global(true),
        );
}

pub async fn parse() -> Result<Option<ChatOptions>> {
    let matches = build().get_matches();

    match matches.subcommand() {
        Some(("chat", subcmd_matches)) => {
            Config::load(vec![&matches, subcmd_matches]).await?;
            return Ok(Some(ChatOptions::from_matches(subcmd_matches)));
        }
        Some(("completions", subcmd_matches)) => {
            if let Some(completions) = subcmd_matches.get_one::<Shell>("shell").copied() {
                let mut app = build();
                print_completions(completions, &mut app);
            }
            return Ok(None);
        }
        Some(("config", subcmd_matches)) => match subcmd_matches.subcommand() {
            Some(("create", _)) => {
                create_config_file().await?;
                return Ok(None);
            }
            Some(("default", _)) => {
                println!("{}", Config::serialize_default(build()));
                return Ok(None);
            }
            Some(("path", _)) => {
                println!("{}", Config::default(ConfigKey::ConfigFile));
                return Ok(None);
            }
            _ => {
                subcommand_config().print_long_help()?;
                return Ok(None);
            }
        },
        Some(("extract", subcmd_matches)) => {
            Config::load(vec![&matches, subcmd_matches]).await?;
            let options = ChatOptions::from_matches(subcmd_matches);
            print_extracted_text(options.files).await?;
            return Ok(None);
        }
        Some(("sets", subcmd_matches)) => match subcmd_matches.subcommand() {
            Some(("list", list_matches)) => {
                Config::load(vec![&matches, subcmd_matches, list_matches]).await?;
                print_sets_list().await?;
                return Ok(None);
            }
            _ => {
                subcommand_sets().print_long_help()?;
                return Ok(None);
            }
        },
        _ => {
            Config::load(vec![&matches]).await?;
            return Ok(Some(ChatOptions::from_matches(&matches)));
        }
    }
}
