use anyhow::Context;
use clap::Parser;
use dotenv::dotenv;
use gcal_tools::booking::{self, BookingCheck, BookingReport, EventTime};
use gcal_tools::AppConfig;
use std::process::ExitCode;

/// The booking checked when no start time is given.
const DEFAULT_GOOGLE_START: &str = "2025-11-22T10:00:00+11:00";

/// Local time the default booking has to show.
const DEFAULT_EXPECTED_LOCAL: &str = "2025-11-22 10:00";

/// Prints how a booking's start time is converted between Google Calendar, the sync payload, the
/// database and the admin calendar.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Booking title shown in the report
    #[arg(long, default_value = "Test Anothertime")]
    title: String,

    /// Start time as returned by Google Calendar (RFC 3339 timestamp or YYYY-MM-DD for all-day
    /// events)
    #[arg(long, value_name = "TIME", default_value = DEFAULT_GOOGLE_START)]
    google_start: String,

    /// IANA time zone the admin calendar displays bookings in [default: from configuration]
    #[arg(long, value_name = "ZONE", env = "BOOKING_TIME_ZONE")]
    time_zone: Option<String>,

    /// Local wall-clock time the booking should show, as "YYYY-MM-DD HH:MM" [default: 2025-11-22
    /// 10:00 for the default booking, none otherwise]
    #[arg(long, value_name = "TIME")]
    expected_local: Option<String>,

    /// Exit with a failure status if the booking does not show at the expected local time
    #[arg(long)]
    strict: bool,
}

impl Cli {
    /// Builds the check, falling back to `default_time_zone` from the configuration.
    fn booking_check(&self, default_time_zone: &str) -> gcal_tools::Result<BookingCheck> {
        let time_zone = self.time_zone.as_deref().unwrap_or(default_time_zone);

        let expected_local = match &self.expected_local {
            Some(expected) => Some(booking::parse_local(expected)?),
            None if self.google_start == DEFAULT_GOOGLE_START => {
                Some(booking::parse_local(DEFAULT_EXPECTED_LOCAL)?)
            }
            None => None,
        };

        Ok(BookingCheck {
            title: self.title.clone(),
            google_start: self.google_start.parse::<EventTime>()?,
            time_zone: booking::parse_time_zone(time_zone)?,
            expected_local,
        })
    }

    /// Whether the run counts as failed. Only mismatches in strict mode fail.
    fn failed(&self, report: &BookingReport) -> bool {
        self.strict && report.matches == Some(false)
    }
}

fn main() -> anyhow::Result<ExitCode> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    dotenv().ok();

    let cli = Cli::parse();

    let config = AppConfig::load().context("loading configuration")?;

    let report = cli
        .booking_check(&config.booking.time_zone)?
        .run()
        .context("checking booking")?;

    println!("{report}");

    if cli.failed(&report) {
        log::error!("booking {:?} does not show at the expected local time", report.title);
        return Ok(ExitCode::FAILURE);
    }

    Ok(ExitCode::SUCCESS)
}
