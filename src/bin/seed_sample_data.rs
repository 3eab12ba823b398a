// Populate the configured database with sample users, posts and follows.
//
// Usage: seed_sample_data [USERS] [POSTS_PER_USER]

use tracing_subscriber::EnvFilter;

use social_feed::{app_state::AppState, config::Config, data_seeder::seed_sample_data};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let user_count: usize = match args.next() {
        Some(raw) => raw.parse()?,
        None => 10,
    };
    let posts_per_user: usize = match args.next() {
        Some(raw) => raw.parse()?,
        None => 5,
    };

    let config = Config::from_env()?;
    let state = AppState::new(config.clone()).await?;

    let summary = seed_sample_data(state.database.pool(), &state.follows, user_count, posts_per_user).await?;

    println!("Seeded {} users into {}", summary.users.len(), config.database.url);
    for user in &summary.users {
        println!("  {}", user);
    }
    println!("{} posts, {} follow requests", summary.posts, summary.follows);

    Ok(())
}
