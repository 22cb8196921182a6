use clap::Parser;

use linkpulse::cli::{Cli, run_command};
use linkpulse::config::{get_config, init_config_from};
use linkpulse::system::init_logging;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_config_from(&cli.config);

    let guard = match init_logging(&get_config().logging) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("{}", e.format_colored());
            None
        }
    };

    let result = run_command(cli.command).await;

    // 退出前刷新日志
    drop(guard);

    if let Err(e) = result {
        eprintln!("{}", e.format_colored());
        std::process::exit(1);
    }
}
