//! Interactive registration of channels into `yt.youtube_channels`.

use eyre::Context;
use std::io::{BufRead, Write};
use std::time::Duration;
use ytscraper::config;
use ytscraper::db::{self, Channel, PgStore};

#[tokio::main]
async fn main() -> eyre::Result<()> {
    ytscraper::init_tracing();
    config::load_dotenv();
    let database_url = std::env::var("DATABASE_URL")
        .ok()
        .filter(|url| !url.is_empty())
        .ok_or_else(|| eyre::eyre!("missing DATABASE_URL"))?;

    let pool = db::connect(&database_url, Duration::from_secs(20)).await?;
    let store = PgStore::new(pool);
    store.apply_schema().await?;

    println!("Add YouTube channels to yt.youtube_channels.");
    println!("Enter 'q' at any prompt to quit.\n");

    let stdin = std::io::stdin();
    let mut input = stdin.lock();
    loop {
        let Some(youtube_channel_id) = prompt(&mut input, "youtube_channel_id")? else {
            return Ok(());
        };
        if youtube_channel_id.is_empty() {
            println!("youtube_channel_id is required.\n");
            continue;
        }
        let Some(name) = prompt(&mut input, "name")? else {
            return Ok(());
        };
        if name.is_empty() {
            println!("name is required.\n");
            continue;
        }
        let Some(symbol) = prompt(&mut input, "symbol (optional)")? else {
            return Ok(());
        };
        let Some(icon) = prompt(&mut input, "icon url/path (optional)")? else {
            return Ok(());
        };

        let channel = Channel {
            youtube_channel_id,
            name,
            symbol: Some(symbol).filter(|s| !s.is_empty()),
            icon: Some(icon).filter(|s| !s.is_empty()),
        };
        match store.upsert_channel(&channel).await {
            Ok(()) => println!(
                "OK: upserted channel {} ({})\n",
                channel.youtube_channel_id, channel.name
            ),
            Err(e) => println!("ERROR: {e:#}\n"),
        }
    }
}

/// Reads one trimmed answer. `None` means quit: `q`, or end of input.
fn prompt(input: &mut impl BufRead, label: &str) -> eyre::Result<Option<String>> {
    print!("{label}: ");
    std::io::stdout().flush().context("flush stdout")?;

    let mut line = String::new();
    if input.read_line(&mut line).context("read stdin")? == 0 {
        return Ok(None);
    }
    let answer = line.trim();
    if answer.eq_ignore_ascii_case("q") {
        return Ok(None);
    }
    Ok(Some(answer.to_string()))
}
