use teloxide::utils::command::BotCommands;

#[derive(BotCommands, Clone, Debug)]
#[command(rename_rule = "lowercase", description = "Available commands:")]
pub enum Command {
    #[command(description = "Show all tracked cryptocurrencies")]
    List,

    #[command(description = "Show top N cryptocurrencies by market cap: /top [N]")]
    Top(String),

    #[command(description = "Add a cryptocurrency to track: /add <coin>")]
    Add(String),

    #[command(description = "Remove a cryptocurrency from tracking: /remove <coin>")]
    Remove(String),

    #[command(description = "Show this help message")]
    Help,
}
