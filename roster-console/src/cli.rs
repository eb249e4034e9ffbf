//! Command-line surface of the `roster` binary.

use clap::{Args, Parser, Subcommand};
use roster_model::{Password, UserDraft, UserId};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "roster",
    version,
    about = "Manage user accounts and role assignments on a Roster server"
)]
pub struct Cli {
    /// Path to a roster.toml file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to a .env file (defaults to ./.env when present)
    #[arg(long, global = true)]
    pub env_file: Option<PathBuf>,

    /// Server origin, overriding configuration
    #[arg(long, global = true)]
    pub server: Option<String>,

    /// Log debug output from the roster crates
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show the signed-in identity
    Whoami,
    /// Show your own profile
    Profile,
    /// List the role catalog
    Roles,
    /// Administer user accounts
    Users {
        #[command(subcommand)]
        action: UsersCommand,
    },
    /// Navigate to a console path, e.g. /admin or /user
    Open { path: String },
}

#[derive(Subcommand, Debug)]
pub enum UsersCommand {
    /// List every user
    List,
    /// Show one user
    Show { id: UserId },
    /// Create a user
    Create(CreateArgs),
    /// Edit a user; omitted fields keep their current value
    Edit(EditArgs),
    /// Delete a user
    Delete {
        id: UserId,
        /// Confirm without showing the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Args, Debug)]
pub struct CreateArgs {
    #[arg(long)]
    pub first_name: String,
    #[arg(long)]
    pub last_name: String,
    #[arg(long)]
    pub email: String,
    #[arg(long, env = "ROSTER_NEW_PASSWORD", hide_env_values = true)]
    pub password: String,
    /// Role name; repeat for several roles
    #[arg(long = "role", required = true)]
    pub roles: Vec<String>,
    #[arg(long)]
    pub age: Option<u32>,
}

impl CreateArgs {
    pub fn to_draft(&self) -> UserDraft {
        UserDraft {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            age: self.age,
            email: self.email.clone(),
            password: Password::new(self.password.clone()),
            roles: self.roles.clone(),
        }
    }
}

#[derive(Args, Debug)]
pub struct EditArgs {
    pub id: UserId,
    #[arg(long)]
    pub first_name: Option<String>,
    #[arg(long)]
    pub last_name: Option<String>,
    #[arg(long)]
    pub email: Option<String>,
    #[arg(long)]
    pub password: Option<String>,
    #[arg(long)]
    pub age: Option<u32>,
    /// Replace the role selection; repeat for several roles
    #[arg(long = "role", conflicts_with = "clear_roles")]
    pub roles: Vec<String>,
    /// Remove every role from the user
    #[arg(long)]
    pub clear_roles: bool,
}

impl EditArgs {
    /// Apply the flags on top of the prefilled modal draft.
    pub fn apply(&self, prefill: &UserDraft) -> UserDraft {
        let mut draft = prefill.clone();
        if let Some(first_name) = &self.first_name {
            draft.first_name = first_name.clone();
        }
        if let Some(last_name) = &self.last_name {
            draft.last_name = last_name.clone();
        }
        if let Some(email) = &self.email {
            draft.email = email.clone();
        }
        if let Some(password) = &self.password {
            draft.password = Password::new(password.clone());
        }
        if self.age.is_some() {
            draft.age = self.age;
        }
        if self.clear_roles {
            draft.roles.clear();
        } else if !self.roles.is_empty() {
            draft.roles = self.roles.clone();
        }
        draft
    }
}

impl Command {
    /// Whether the command only works inside the console view.
    pub fn needs_console(&self) -> bool {
        matches!(self, Command::Roles | Command::Users { .. })
    }
}
