mod command;
mod config;
mod derpibooru;
mod error;
mod fetch;
mod message_handler;
mod relay;
mod utils;

use anyhow::Context as _;
use serenity::{
    async_trait,
    model::{channel::Message, gateway::Ready},
    prelude::*,
};
use tracing::{debug, error, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::Config;
use derpibooru::{DerpibooruApi, SearchClient};
use fetch::HttpFetcher;
use message_handler::{Outcome, Pipeline};
use relay::ChannelRelay;

struct Handler {
    pipeline: Pipeline<DerpibooruApi, HttpFetcher>,
}

#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, _ctx: Context, ready: Ready) {
        info!(user = %ready.user.name, "I'm logged in");
    }

    async fn message(&self, ctx: Context, new_message: Message) {
        let relay = ChannelRelay::new(ctx.http.clone(), new_message.channel_id);
        // very important! bot authors are skipped, this avoids infinite loops and whatnot
        match self
            .pipeline
            .handle_message(new_message.author.bot, &new_message.content, &relay)
            .await
        {
            Ok(Outcome::Ignored) => {}
            Ok(Outcome::Relayed { uploaded, skipped }) => {
                debug!(uploaded, skipped, "search relayed");
            }
            Err(e) => error!(
                channel = %new_message.channel_id,
                content = %new_message.content,
                error = %e,
                "search aborted"
            ),
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // a missing .env is fine, the variables may come from the real environment
    dotenvy::dotenv().ok();
    init_tracing();

    let config = Config::from_env()?;
    info!(?config, "starting");

    let http = utils::http_client(config.timeout).context("building HTTP client")?;
    let search = SearchClient::new(DerpibooruApi::new(http.clone(), &config), config.limit);
    let pipeline = Pipeline::new(&config, search, HttpFetcher::new(http));

    let intents = GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::DIRECT_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT;
    let mut client = Client::builder(&config.token, intents)
        .event_handler(Handler { pipeline })
        .await
        .context("Error creating client!")?;

    // Shards will automatically attempt to reconnect, and will perform
    // exponential backoff until it reconnects.
    client.start().await.context("Client error")?;
    Ok(())
}
