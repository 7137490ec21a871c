use std::io::Write as _;
use std::process::ExitCode;

use anyhow::Context as _;
use clap::Parser as _;

use ljfetch::cli::{Cli, Command};
use ljfetch::config::Config;
use ljfetch::download::Mode;
use ljfetch::formats::IssueNumber;
use ljfetch::notify::SendmailNotifier;

fn main() -> ExitCode {
    if let Err(err) = try_main() {
        eprintln!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

fn try_main() -> anyhow::Result<()> {
    ljfetch::logging::init().context("init logging")?;

    let cli = Cli::parse();
    tracing::debug!(?cli, "parsed cli");

    let (args, mode) = match cli.command {
        Command::List(args) => {
            let config = Config::from_args(args).context("resolve options")?;
            let issues = ljfetch::run::list(&config).context("list")?;
            let mut stdout = std::io::stdout().lock();
            for issue in issues {
                serde_json::to_writer(&mut stdout, &issue).context("write issue json")?;
                stdout.write_all(b"\n").context("write issue newline")?;
            }
            return Ok(());
        }
        Command::All(args) => (args, Mode::All),
        Command::Issue(args) => (args.fetch, Mode::Issue(IssueNumber::new(args.number))),
        Command::Latest(args) => (args, Mode::Latest),
        Command::New(args) => (args, Mode::New),
    };

    let config = Config::from_args(args).context("resolve options")?;
    let notifier = SendmailNotifier::new(config.sendmail.clone());
    let paths = ljfetch::run::run(&config, mode, &notifier).context("fetch issues")?;
    for path in paths {
        println!("{}", path.display());
    }

    Ok(())
}
