use clap::{Args, Parser, Subcommand, ValueEnum};
use pipeline_core::StageDeletePolicy;
use pipeline_domain::{LabelColor, LabelContext};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "pipeline")]
#[command(about = "Manage the clinic sales pipeline", long_about = None)]
#[command(
    version,
    long_version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("GIT_COMMIT_HASH"), ")")
)]
pub struct Cli {
    /// Base URL of the clinic API (overrides config and PIPELINE_API_URL)
    #[arg(long, global = true, value_name = "URL")]
    pub api_url: Option<String>,

    /// Bearer token for the clinic API (overrides config and PIPELINE_API_TOKEN)
    #[arg(long, global = true, value_name = "TOKEN")]
    pub token: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show every stage with its opportunities
    Board,
    /// Stage operations
    Stage(StageCommand),
    /// Opportunity operations
    Opportunity(OpportunityCommand),
    /// Note operations
    Note(NoteCommand),
    /// Label operations
    Label(LabelCommand),
    /// Inspect the effective configuration
    Config(ConfigCommand),
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

// Stage commands
#[derive(Args)]
pub struct StageCommand {
    #[command(subcommand)]
    pub action: StageAction,
}

#[derive(Subcommand)]
pub enum StageAction {
    /// List stages in display order
    List,
    /// Append a new stage after the last one
    Create {
        #[arg(long)]
        name: String,
    },
    /// Rename a stage
    Rename {
        #[arg(long)]
        id: Uuid,
        #[arg(long)]
        name: String,
    },
    /// Delete a stage
    Delete {
        #[arg(long)]
        id: Uuid,
        /// What to do with opportunities still in the stage
        #[arg(long, value_enum)]
        policy: Option<DeletePolicyArg>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DeletePolicyArg {
    Block,
    Orphan,
    Cascade,
}

impl From<DeletePolicyArg> for StageDeletePolicy {
    fn from(arg: DeletePolicyArg) -> Self {
        match arg {
            DeletePolicyArg::Block => StageDeletePolicy::Block,
            DeletePolicyArg::Orphan => StageDeletePolicy::Orphan,
            DeletePolicyArg::Cascade => StageDeletePolicy::Cascade,
        }
    }
}

// Opportunity commands
#[derive(Args)]
pub struct OpportunityCommand {
    #[command(subcommand)]
    pub action: OpportunityAction,
}

#[derive(Subcommand)]
pub enum OpportunityAction {
    /// List opportunities
    List {
        /// Only opportunities in this stage
        #[arg(long)]
        stage_id: Option<Uuid>,
    },
    /// Show an opportunity with its notes
    Show {
        #[arg(long)]
        id: Uuid,
    },
    /// Create an opportunity in the first stage
    Create(OpportunityCreateArgs),
    /// Move an opportunity to another stage
    Move {
        #[arg(long)]
        id: Uuid,
        #[arg(long)]
        stage_id: Uuid,
    },
    /// Edit an opportunity's title, description or label
    Update(OpportunityUpdateArgs),
    /// Delete an opportunity and its notes
    Delete {
        #[arg(long)]
        id: Uuid,
    },
}

#[derive(Args)]
pub struct OpportunityCreateArgs {
    #[arg(long)]
    pub title: String,
    #[arg(long)]
    pub description: Option<String>,
    /// Name of an existing sales label
    #[arg(long)]
    pub label: Option<String>,
    #[arg(long)]
    pub patient_id: Option<Uuid>,
}

#[derive(Args)]
pub struct OpportunityUpdateArgs {
    #[arg(long)]
    pub id: Uuid,
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long, conflicts_with = "clear_description")]
    pub description: Option<String>,
    #[arg(long)]
    pub clear_description: bool,
    /// Name of an existing sales label
    #[arg(long, conflicts_with = "clear_label")]
    pub label: Option<String>,
    #[arg(long)]
    pub clear_label: bool,
}

// Note commands
#[derive(Args)]
pub struct NoteCommand {
    #[command(subcommand)]
    pub action: NoteAction,
}

#[derive(Subcommand)]
pub enum NoteAction {
    /// Add a note to an opportunity
    Add {
        #[arg(long)]
        opportunity_id: Uuid,
        #[arg(long)]
        body: String,
    },
}

// Label commands
#[derive(Args)]
pub struct LabelCommand {
    #[command(subcommand)]
    pub action: LabelAction,
}

#[derive(Subcommand)]
pub enum LabelAction {
    /// List labels usable on opportunities
    List,
    /// Create a label
    Create {
        #[arg(long)]
        name: String,
        /// Palette color, by name (blue, red, ...) or hex code
        #[arg(long, value_parser = parse_color)]
        color: LabelColor,
        /// Restrict the label to one part of the application
        #[arg(long, value_enum)]
        context: Option<LabelContextArg>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LabelContextArg {
    Sales,
    Appointment,
}

impl From<LabelContextArg> for LabelContext {
    fn from(arg: LabelContextArg) -> Self {
        match arg {
            LabelContextArg::Sales => LabelContext::Sales,
            LabelContextArg::Appointment => LabelContext::Appointment,
        }
    }
}

fn parse_color(s: &str) -> Result<LabelColor, String> {
    LabelColor::parse(s).ok_or_else(|| {
        let names: Vec<_> = LabelColor::ALL.iter().map(|c| c.name()).collect();
        format!("unknown color '{}' (expected one of: {})", s, names.join(", "))
    })
}

// Config commands
#[derive(Args)]
pub struct ConfigCommand {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the configuration after file, environment and flag overrides
    Show,
    /// Print where the config file is looked up
    Path,
}
