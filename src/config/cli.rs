use clap::{Parser, Subcommand};

#[derive(Debug, Clone, Parser)]
#[command(name = "clinic-slots")]
#[command(about = "Appointment slot availability and booking for clinic providers")]
pub struct CliConfig {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "clinic-slots.toml")]
    pub config: String,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// List the services a provider offers
    Services {
        #[arg(long)]
        provider: String,
    },
    /// List free slots for a provider's service on a date
    Slots {
        #[arg(long)]
        provider: String,
        #[arg(long)]
        service: String,
        /// yyyy-MM-dd
        #[arg(long)]
        date: String,
    },
    /// Book a slot for a patient
    Book {
        #[arg(long)]
        provider: String,
        #[arg(long)]
        patient: String,
        #[arg(long)]
        service: String,
        #[arg(long)]
        date: String,
        /// HH:mm start of the chosen slot
        #[arg(long)]
        start: String,
        #[arg(long, default_value = "")]
        notes: String,
        /// Acting user, defaults to the patient
        #[arg(long)]
        actor: Option<String>,
        #[arg(long, default_value = "patient")]
        role: String,
    },
    /// Change a booking's status (confirmed, pending, cancelled, completed, no-show)
    SetStatus {
        #[arg(long)]
        booking: String,
        #[arg(long)]
        status: String,
        #[arg(long)]
        actor: String,
        #[arg(long)]
        role: String,
    },
    /// Permanently delete a booking (admin only)
    Delete {
        #[arg(long)]
        booking: String,
        #[arg(long)]
        actor: String,
        #[arg(long)]
        role: String,
    },
    /// Print a provider's bookings for a date as CSV
    Export {
        #[arg(long)]
        provider: String,
        #[arg(long)]
        date: String,
        /// Write to this file instead of stdout
        #[arg(long)]
        output: Option<String>,
    },
    /// Load and validate the configuration, then exit
    CheckConfig,
}
