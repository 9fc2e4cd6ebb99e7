// discord.rs - Serenity glue
// Turns gateway events into Invocations for the dispatcher and carries Responses back
// to Discord. Prefix messages and slash command interactions share the same pipeline;
// every invocation runs on its own task.

use log::{debug, error, info, warn};
use once_cell::sync::OnceCell;
use serenity::{
    async_trait,
    builder::CreateEmbed,
    client::{Context, EventHandler},
    http::{error::Error as HttpError, Http},
    model::{
        application::{
            command::{Command as ApplicationCommand, CommandOptionType},
            interaction::{
                application_command::ApplicationCommandInteraction, Interaction,
                InteractionResponseType,
            },
        },
        channel::Message,
        gateway::Ready,
        id::ChannelId,
    },
    Error as SerenityError,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::command_ids::{CommandIds, DiscordCommandIds};
use crate::commands::{
    CallerContext, CommandCatalog, CommandProperties, DispatchOutcome, Dispatcher, Invocation,
    InvocationType,
};
use crate::config::BotConfig;
use crate::error::{CommandError, DeliveryError, Rejection};
use crate::permission::RolePermissionResolver;
use crate::reply::{Content, Embed, ReplySink, Response, COLOUR_RED};
use crate::reporting::LogReporter;

/// "Cannot send messages to this user"
const CANNOT_MESSAGE_USER: isize = 50007;

// ============================================================================
// EVENT HANDLER
// ============================================================================

pub struct Handler {
    config: Arc<BotConfig>,
    catalog: Arc<CommandCatalog>,
    /// Built on the first `ready`, once an HTTP client is available
    dispatcher: OnceCell<Dispatcher>,
}

impl Handler {
    pub fn new(config: Arc<BotConfig>, catalog: Arc<CommandCatalog>) -> Self {
        Self {
            config,
            catalog,
            dispatcher: OnceCell::new(),
        }
    }
}

#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        println!("✅ Bot connected as {}!", ready.user.name);
        info!("Connected to {} guilds", ready.guilds.len());

        // Reconnects fire `ready` again; commands are already registered by then
        if self.dispatcher.get().is_some() {
            return;
        }

        let command_ids = Arc::new(DiscordCommandIds::new(ctx.http.clone()));
        match register_slash_commands(&ctx.http, &self.catalog, self.config.whitelabel).await {
            Ok(ids) => {
                info!("Registered {} slash commands", ids.len());
                command_ids.remember(ready.user.id, ids).await;
            }
            Err(e) => error!("Failed to register slash commands: {}", e),
        }

        let dispatcher = Dispatcher::new(
            self.catalog.clone(),
            Arc::new(RolePermissionResolver::new(ctx.http.clone(), self.config.roles.clone())),
            command_ids,
            Arc::new(LogReporter),
        );
        if self.dispatcher.set(dispatcher).is_err() {
            debug!("Dispatcher already initialised by a concurrent ready event");
        }
    }

    async fn message(&self, ctx: Context, msg: Message) {
        if msg.author.bot {
            return;
        }
        let Some(dispatcher) = self.dispatcher.get() else {
            return;
        };
        let Some((token, args)) = parse_prefixed(&msg.content, &self.config.prefix) else {
            return;
        };

        let caller = CallerContext::from_config(
            &self.config,
            msg.guild_id,
            msg.author.id,
            ctx.cache.current_user_id(),
        );
        let invocation = Invocation {
            token,
            caller,
            args,
            reply: Arc::new(MessageReply::new(ctx.http.clone(), msg.channel_id)),
        };

        let dispatcher = dispatcher.clone();
        tokio::spawn(async move {
            let outcome = dispatcher.dispatch(invocation).await;
            debug!("[DISCORD] prefix command finished: {:?}", outcome);
        });
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        let Interaction::ApplicationCommand(command) = interaction else {
            return;
        };
        let Some(dispatcher) = self.dispatcher.get() else {
            return;
        };

        let caller = CallerContext::from_config(
            &self.config,
            command.guild_id,
            command.user.id,
            ctx.cache.current_user_id(),
        );
        let token = command.data.name.clone();
        let args = interaction_args(&command);
        let reply = Arc::new(InteractionReply::new(ctx.http.clone(), command));
        let invocation = Invocation {
            token,
            caller,
            args,
            reply: reply.clone(),
        };

        let dispatcher = dispatcher.clone();
        tokio::spawn(async move {
            let outcome = dispatcher.dispatch(invocation).await;
            debug!("[DISCORD] slash command finished: {:?}", outcome);

            // Discord expects an answer to every interaction, so tell the user why
            if reply.has_responded() {
                return;
            }
            if let Some(message) = outcome_notice(&outcome) {
                let notice = Embed::new("Error").colour(COLOUR_RED).description(message);
                if let Err(e) = reply.send(Response::embed(notice).ephemeral(true)).await {
                    debug!("[DISCORD] could not send outcome notice: {}", e);
                }
            }
        });
    }
}

/// What to tell a slash command user when their invocation produced no reply
pub fn outcome_notice(outcome: &DispatchOutcome) -> Option<&'static str> {
    match outcome {
        DispatchOutcome::Completed => None,
        DispatchOutcome::Rejected(Rejection::UnknownCommand) => Some("This command is not available"),
        DispatchOutcome::Rejected(Rejection::Ineligible(_)) => {
            Some("You do not have permission to use this command")
        }
        DispatchOutcome::Rejected(Rejection::PermissionResolutionFailed(_)) => {
            Some("Could not check your permissions, please try again")
        }
        DispatchOutcome::Failed(CommandError::TimedOut(_)) => Some("The command took too long to respond"),
        DispatchOutcome::Failed(CommandError::InvalidArguments(_)) => Some("Invalid arguments for this command"),
        DispatchOutcome::Failed(_) => Some("An error occurred while running this command"),
    }
}

/// Split `<prefix><command> <args>` into the command token and the raw arguments
pub fn parse_prefixed(content: &str, prefix: &str) -> Option<(String, String)> {
    let rest = content.strip_prefix(prefix)?.trim_start();
    let (token, args) = match rest.split_once(char::is_whitespace) {
        Some((token, args)) => (token, args.trim()),
        None => (rest, ""),
    };

    if token.is_empty() {
        return None;
    }
    Some((token.to_string(), args.to_string()))
}

fn interaction_args(command: &ApplicationCommandInteraction) -> String {
    command
        .data
        .options
        .iter()
        .filter_map(|option| option.value.as_ref())
        .map(|value| match value.as_str() {
            Some(text) => text.to_string(),
            None => value.to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

// ============================================================================
// SLASH COMMAND REGISTRATION
// ============================================================================

/// Register every slash command of the catalog globally, replacing whatever was
/// registered before. Returns the ids Discord assigned.
pub async fn register_slash_commands(
    http: &Arc<Http>,
    catalog: &CommandCatalog,
    whitelabel: bool,
) -> Result<CommandIds, SerenityError> {
    let slash = slash_commands(catalog, whitelabel);

    let registered = ApplicationCommand::set_global_application_commands(http, |commands| {
        for properties in &slash {
            commands.create_application_command(|command| {
                command.name(&properties.name).description(&properties.description);
                for argument in &properties.arguments {
                    command.create_option(|option| {
                        option
                            .name(&argument.name)
                            .description(&argument.description)
                            .kind(CommandOptionType::String)
                            .required(argument.required)
                    });
                }
                command
            });
        }
        commands
    })
    .await?;

    Ok(registered
        .into_iter()
        .map(|command| (command.name, command.id))
        .collect())
}

/// Commands that should exist as slash commands on this deployment
pub fn slash_commands(catalog: &CommandCatalog, whitelabel: bool) -> Vec<&CommandProperties> {
    catalog
        .all()
        .map(|command| command.properties())
        .filter(|properties| properties.invocation_type == InvocationType::ChatInput)
        .filter(|properties| !(whitelabel && properties.main_bot_only))
        .collect()
}

// ============================================================================
// REPLY SINKS
// ============================================================================

fn write_embed<'a>(embed: &Embed, builder: &'a mut CreateEmbed) -> &'a mut CreateEmbed {
    builder.title(&embed.title).colour(embed.colour);
    if let Some(description) = &embed.description {
        builder.description(description);
    }
    for field in &embed.fields {
        builder.field(&field.name, &field.value, field.inline);
    }
    if let Some(footer) = &embed.footer {
        builder.footer(|f| f.text(footer));
    }
    builder
}

fn discord_error_code(err: &SerenityError) -> Option<isize> {
    match err {
        SerenityError::Http(http_err) => match &**http_err {
            HttpError::UnsuccessfulRequest(response) => Some(response.error.code),
            _ => None,
        },
        _ => None,
    }
}

fn classify_delivery_failure(code: Option<isize>, message: String) -> DeliveryError {
    match code {
        Some(CANNOT_MESSAGE_USER) => DeliveryError::Unreachable,
        _ => DeliveryError::Other(message),
    }
}

fn delivery_error(err: SerenityError) -> DeliveryError {
    classify_delivery_failure(discord_error_code(&err), err.to_string())
}

/// Replies to a prefix command in the channel it was sent in. Channel messages
/// can't be ephemeral, so that flag is ignored.
pub struct MessageReply {
    http: Arc<Http>,
    channel_id: ChannelId,
}

impl MessageReply {
    pub fn new(http: Arc<Http>, channel_id: ChannelId) -> Self {
        Self { http, channel_id }
    }
}

#[async_trait]
impl ReplySink for MessageReply {
    async fn send(&self, response: Response) -> Result<(), DeliveryError> {
        self.channel_id
            .send_message(&self.http, |m| {
                match &response.content {
                    Content::Text(text) => m.content(text),
                    Content::Embed(embed) => m.embed(|e| write_embed(embed, e)),
                };
                m
            })
            .await
            .map(|_| ())
            .map_err(delivery_error)
    }
}

/// Replies to a slash command. The first reply answers the interaction, later
/// ones are sent as follow-ups.
pub struct InteractionReply {
    http: Arc<Http>,
    interaction: ApplicationCommandInteraction,
    responded: AtomicBool,
}

impl InteractionReply {
    pub fn new(http: Arc<Http>, interaction: ApplicationCommandInteraction) -> Self {
        Self {
            http,
            interaction,
            responded: AtomicBool::new(false),
        }
    }

    /// Whether the interaction has already been answered
    pub fn has_responded(&self) -> bool {
        self.responded.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ReplySink for InteractionReply {
    async fn send(&self, response: Response) -> Result<(), DeliveryError> {
        if !self.responded.swap(true, Ordering::SeqCst) {
            return self
                .interaction
                .create_interaction_response(&self.http, |r| {
                    r.kind(InteractionResponseType::ChannelMessageWithSource)
                        .interaction_response_data(|data| {
                            match &response.content {
                                Content::Text(text) => data.content(text),
                                Content::Embed(embed) => data.embed(|e| write_embed(embed, e)),
                            };
                            data.ephemeral(response.ephemeral)
                        })
                })
                .await
                .map_err(delivery_error);
        }

        warn!("[DISCORD] interaction {} already answered, sending follow-up", self.interaction.id);
        self.interaction
            .create_followup_message(&self.http, |f| {
                match &response.content {
                    Content::Text(text) => f.content(text),
                    Content::Embed(embed) => f.embed(|e| write_embed(embed, e)),
                };
                f.ephemeral(response.ephemeral)
            })
            .await
            .map(|_| ())
            .map_err(delivery_error)
    }
}
