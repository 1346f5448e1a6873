use boxcast::{BoxCastClient, ClientConfig};
use eyre::Context;
use std::io::IsTerminal;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage: boxcast-cli --client_id <ID> --client_secret <SECRET>";

#[derive(Debug, Default)]
struct Args {
    client_id: Option<String>,
    client_secret: Option<String>,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> eyre::Result<Args> {
    let mut parsed = Args::default();
    while let Some(arg) = args.next() {
        let (flag, inline) = match arg.split_once('=') {
            Some((flag, value)) => (flag.to_string(), Some(value.to_string())),
            None => (arg, None),
        };
        let slot = match flag.as_str() {
            "--client_id" | "--client-id" => &mut parsed.client_id,
            "--client_secret" | "--client-secret" => &mut parsed.client_secret,
            "-h" | "--help" => {
                println!("{USAGE}");
                std::process::exit(0);
            }
            other => eyre::bail!("unknown argument {other}\n{USAGE}"),
        };
        let value = match inline {
            Some(value) => value,
            None => args
                .next()
                .ok_or_else(|| eyre::eyre!("{flag} needs a value\n{USAGE}"))?,
        };
        *slot = Some(value);
    }
    Ok(parsed)
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .init();

    let args = parse_args(std::env::args().skip(1))?;
    let client_id = args
        .client_id
        .or_else(|| std::env::var("BOXCAST_CLIENT_ID").ok())
        .ok_or_else(|| eyre::eyre!("no client id given\n{USAGE}"))?;
    let client_secret = args
        .client_secret
        .or_else(|| std::env::var("BOXCAST_CLIENT_SECRET").ok())
        .ok_or_else(|| eyre::eyre!("no client secret given\n{USAGE}"))?;

    let config = ClientConfig::from_env().context("read BOXCAST_* configuration")?;
    let client = BoxCastClient::with_config(client_id, client_secret, config)
        .await
        .context("authorize with BoxCast")?;

    let account = client.get_account().await.context("fetch account")?;
    println!("{account}");

    Ok(())
}
