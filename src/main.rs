use clap::Parser;
use clinic_slots::config::{Command, StoreKind};
use clinic_slots::adapters::SnapshotLock;
use clinic_slots::domain::time::{format_date, parse_date, parse_time};
use clinic_slots::utils::error::ErrorSeverity;
use clinic_slots::utils::{logger, validation::Validate};
use clinic_slots::{
    BookingError, BookingResult, BookingStatus, BookingStore, CliConfig, HttpStore,
    InMemoryStore, RequestContext, Result, Role, SlotEngine, TomlConfig,
};

const DEFAULT_SNAPSHOT: &str = "clinic.json";

#[tokio::main]
async fn main() {
    let cli = CliConfig::parse();

    let config = match TomlConfig::from_file(&cli.config) {
        Ok(config) => config,
        Err(BookingError::IoError(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            TomlConfig::default()
        }
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", cli.config, e);
            eprintln!("💡 Make sure the file is valid TOML");
            std::process::exit(1);
        }
    };

    if config.json_logs() {
        logger::init_json_logger(cli.verbose, config.log_level());
    } else {
        logger::init_cli_logger(cli.verbose, config.log_level());
    }
    tracing::debug!("CLI args: {:?}", cli);

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        exit_with(e);
    }

    if let Err(e) = dispatch(cli.command, config).await {
        exit_with(e);
    }
}

fn exit_with(e: BookingError) -> ! {
    tracing::error!(
        "❌ {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());
    if e.is_retryable() {
        eprintln!("🔁 Nothing was saved, the same command can be run again");
    }

    let exit_code = match e.severity() {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code);
}

async fn dispatch(command: Command, config: TomlConfig) -> Result<()> {
    if let Command::CheckConfig = command {
        println!("✅ Configuration is valid ({:?} store)", config.store.r#type);
        return Ok(());
    }

    match config.store.r#type {
        StoreKind::Memory => {
            let path = config
                .store
                .snapshot
                .clone()
                .unwrap_or_else(|| DEFAULT_SNAPSHOT.to_string());
            // 從讀取到寫回都持有鎖，其他 clinic-slots 行程會排隊等待
            let _lock = SnapshotLock::acquire(&path).await?;
            let store = InMemoryStore::load(&path).await?;
            let engine = SlotEngine::new(store.clone(), config);
            if run(&engine, command).await? {
                store.save(&path).await?;
                tracing::debug!("Snapshot written to {}", path);
            }
        }
        StoreKind::Http => {
            let endpoint = config.store.endpoint.clone().unwrap_or_default();
            let store = HttpStore::new(&endpoint, config.store_timeout())?;
            let engine = SlotEngine::new(store, config);
            run(&engine, command).await?;
        }
    }
    Ok(())
}

/// Runs one command. Returns whether the store was modified.
async fn run<S: BookingStore>(engine: &SlotEngine<S, TomlConfig>, command: Command) -> Result<bool> {
    match command {
        Command::Services { provider } => {
            for service in engine.list_services(&provider).await? {
                println!(
                    "  {}  {} ({} min, {})",
                    service.id, service.name, service.duration_minutes, service.price
                );
            }
            Ok(false)
        }
        Command::Slots {
            provider,
            service,
            date,
        } => {
            let date = parse_date(&date)?;
            let slots = engine.require_available_slots(&provider, &service, date).await?;
            println!("Available slots for {} on {}:", provider, format_date(date));
            for slot in slots {
                println!("  {}", slot);
            }
            Ok(false)
        }
        Command::Book {
            provider,
            patient,
            service,
            date,
            start,
            notes,
            actor,
            role,
        } => {
            let date = parse_date(&date)?;
            let role: Role = role.parse()?;
            let ctx = RequestContext::new(actor.unwrap_or_else(|| patient.clone()), role);
            let slot = engine
                .slot_starting_at(&provider, &service, parse_time(&start)?)
                .await?;

            match engine
                .confirm_booking_with_notes(&ctx, &provider, &patient, &service, date, slot, &notes)
                .await
            {
                BookingResult::Confirmed(booking) => {
                    println!(
                        "✅ Booked {} on {} {} (id {})",
                        booking.patient_id,
                        format_date(booking.date),
                        booking.slot(),
                        booking.id
                    );
                    Ok(true)
                }
                BookingResult::SlotNoLongerAvailable => Err(BookingError::SlotNoLongerAvailable {
                    date: format_date(date),
                    slot: slot.to_string(),
                }),
                BookingResult::Failed(e) => Err(e),
            }
        }
        Command::SetStatus {
            booking,
            status,
            actor,
            role,
        } => {
            let status: BookingStatus = status.parse()?;
            let ctx = RequestContext::new(actor, role.parse()?);
            let updated = engine.update_status(&ctx, &booking, status).await?;
            println!("✅ Booking {} is now {}", updated.id, updated.status);
            Ok(true)
        }
        Command::Delete {
            booking,
            actor,
            role,
        } => {
            let ctx = RequestContext::new(actor, role.parse()?);
            engine.delete_booking(&ctx, &booking).await?;
            println!("🗑️ Booking {} deleted", booking);
            Ok(true)
        }
        Command::Export {
            provider,
            date,
            output,
        } => {
            let date = parse_date(&date)?;
            let csv = engine.export_day_schedule(&provider, date).await?;
            match output {
                Some(path) => {
                    tokio::fs::write(&path, csv).await?;
                    println!("📁 Schedule saved to: {}", path);
                }
                None => print!("{}", csv),
            }
            Ok(false)
        }
        Command::CheckConfig => Ok(false),
    }
}
