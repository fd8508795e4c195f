use argh::FromArgs;
use tracing_subscriber::EnvFilter;
use utsh::config::DEFAULT_PROMPT;
use utsh::history::DEFAULT_CAPACITY;
use utsh::{Interpreter, ShellConfig};

#[derive(FromArgs)]
/// A small interactive shell with pipelines, redirection and history recall.
struct Options {
    #[argh(option, short = 'c')]
    /// run a single line and exit with its status
    command: Option<String>,

    #[argh(option, default = "DEFAULT_CAPACITY")]
    /// number of history entries to keep
    history_size: usize,

    #[argh(option)]
    /// prompt printed before each line
    prompt: Option<String>,

    #[argh(option)]
    /// log filter, e.g. `debug` or `utsh=trace` (overrides UTSH_LOG)
    log_level: Option<String>,
}

fn init_logging(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_env("UTSH_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let options: Options = argh::from_env();
    init_logging(options.log_level.as_deref());

    let config = ShellConfig {
        prompt: options.prompt.unwrap_or_else(|| DEFAULT_PROMPT.to_string()),
        history_capacity: options.history_size,
        ..ShellConfig::default()
    };
    let mut shell = Interpreter::with_config(config);

    let code = match options.command {
        Some(line) => shell.execute_line(&line),
        None => shell.repl()?,
    };
    std::process::exit(code)
}
