//! Recommend command - suggests titles for a viewer profile

use clap::Args;

use super::{bootstrap, print_usage};
use crate::domain::{ContentType, ViewerProfile};

#[derive(Args, Debug)]
pub struct RecommendArgs {
    #[arg(long)]
    pub age: u32,

    /// Free-text interests, e.g. "space, cooking"
    #[arg(long, default_value = "")]
    pub interests: String,

    #[arg(long, default_value = "Chill")]
    pub mood: String,

    #[arg(long, default_value = "Any")]
    pub style: String,

    /// `anime` or `manga`
    #[arg(long = "type", default_value = "anime")]
    pub content_type: ContentType,

    /// Print the list as JSON
    #[arg(long)]
    pub json: bool,
}

impl RecommendArgs {
    pub fn viewer_profile(&self) -> ViewerProfile {
        ViewerProfile {
            age: self.age,
            interests: self.interests.clone(),
            mood: self.mood.clone(),
            style: self.style.clone(),
            content_type: self.content_type,
        }
    }
}

pub async fn run(args: RecommendArgs) -> anyhow::Result<()> {
    let orchestrator = bootstrap()?;
    let items = orchestrator.recommend(args.viewer_profile()).await;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&items)?);
    } else if items.is_empty() {
        println!("No recommendations right now. Please try again.");
    } else {
        for (index, item) in items.iter().enumerate() {
            println!("{}. {} [{}]\n   {}", index + 1, item.title, item.genre, item.reason);
        }
    }

    print_usage(&orchestrator);
    Ok(())
}
