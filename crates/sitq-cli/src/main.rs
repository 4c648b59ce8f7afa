use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use sitq_cli::commands;
use sitq_cli::commands::run::RunOptions;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "sitq")]
#[command(author, version, about, long_about = None)]
#[command(
    about = "Watch a web page and run a booking sequence as soon as it opens up",
    long_about = "SitQ waits for you to log in, then polls a page until the target becomes \
                  available and fills in and submits the booking form. When a challenge \
                  appears it stops and asks you to finish by hand."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in, poll for availability and attempt the booking
    Run {
        /// Path to the JSON config file
        #[arg(short, long, value_name = "FILE", default_value = "config.json")]
        config: PathBuf,

        /// Run Chrome without a window (testing only)
        #[arg(long)]
        headless: bool,

        /// Chrome user-data-dir, keeps the login cached between runs
        #[arg(long, value_name = "DIR", conflicts_with = "profile")]
        user_data_dir: Option<PathBuf>,

        /// Named persistent profile under ~/.sitq/profiles
        #[arg(long, value_name = "NAME")]
        profile: Option<String>,

        /// Path to the Chrome binary (auto-detected if omitted)
        #[arg(long, value_name = "PATH")]
        chrome_path: Option<PathBuf>,

        /// Attach to a Chrome already listening on this remote-debugging port
        #[arg(
            long,
            value_name = "PORT",
            conflicts_with_all = ["headless", "user_data_dir", "profile", "chrome_path"]
        )]
        attach: Option<u16>,

        /// Log notifications only, without desktop alerts
        #[arg(long)]
        no_desktop_notify: bool,
    },

    /// Check a config file without starting a browser
    Validate {
        /// Path to the JSON config file
        #[arg(short, long, value_name = "FILE", default_value = "config.json")]
        config: PathBuf,
    },

    /// Generate shell completion scripts
    #[command(long_about = "Generate shell completion scripts for sitq.

SUPPORTED SHELLS:
    bash, zsh, fish, powershell, elvish

INSTALLATION:
    Bash:
        sitq completion --shell bash > ~/.local/share/bash-completion/completions/sitq

    Zsh:
        sitq completion --shell zsh > ~/.zfunc/_sitq
        Then add 'fpath=(~/.zfunc $fpath)' to ~/.zshrc before compinit

    Fish:
        sitq completion --shell fish > ~/.config/fish/completions/sitq.fish")]
    Completion {
        /// Shell to generate completions for
        #[arg(long, value_enum)]
        shell: Shell,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Run {
            config,
            headless,
            user_data_dir,
            profile,
            chrome_path,
            attach,
            no_desktop_notify,
        } => commands::run::execute(RunOptions {
            config,
            headless,
            user_data_dir,
            profile,
            chrome_path,
            attach,
            desktop_notify: !no_desktop_notify,
        }),
        Commands::Validate { config } => commands::validate::execute(&config),
        Commands::Completion { shell } => {
            let mut cmd = Cli::command();
            commands::completion::execute(shell, &mut cmd)
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(sitq_cli::exit_code(&e))
        }
    }
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("sitq=debug,sitq_cli=debug,sitq_core=debug,sitq_browser=debug")
    } else {
        EnvFilter::new("sitq=info,sitq_cli=info,sitq_core=info,sitq_browser=info")
    };

    // Runs last for hours, so keep timestamps
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
