//! halo - notification alert color engine, demo driver.
//!
//! Wires the service to simulated collaborators and walks through a short
//! scripted day: notifications arrive while the screen is off, the user
//! picks the device up, unlocks it, and the alerts drain away.

mod sim;

use std::time::Duration;

use clap::Parser;
use halo_core::{
    Collaborators, HostEvent, MemorySettings, MotionState, NotificationRecord, ScreenState,
    Service,
};
use tracing_subscriber::filter::EnvFilter;

use crate::sim::{ConsoleOverlay, SimEnvironment, SimNotifications, SimSensor};

const OWN_PACKAGE: &str = "app.halo";

#[derive(Parser)]
#[command(version, about = "notification alert color engine demo")]
struct Cli {
    /// Seen-timeout for the screen-off battery mode, in milliseconds
    #[arg(long, default_value_t = 3_000)]
    seen_timeout_ms: i64,

    /// Ignore the system do-not-disturb filter
    #[arg(long)]
    ignore_dnd: bool,
}

fn init_logging() {
    let filter = EnvFilter::builder()
        .with_default_directive(tracing::Level::INFO.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn record(
    key: &str,
    package: &str,
    channel: &str,
    lights: Option<u32>,
    accent: u32,
) -> NotificationRecord {
    NotificationRecord {
        key: key.to_string(),
        package: package.to_string(),
        channel_id: Some(channel.to_string()),
        lights,
        accent,
        ticker: Some(format!("{key} arrived")),
        posted_at_ms: 0,
    }
}

#[tokio::main]
async fn main() {
    init_logging();
    let cli = Cli::parse();

    let mut settings = MemorySettings::default();
    {
        let config = settings.config_mut();
        config.modes.screen_off_battery.seen_timeout_ms = cli.seen_timeout_ms;
        config.respect_do_not_disturb = !cli.ignore_dnd;
    }

    let notifications = SimNotifications::default();
    let environment = SimEnvironment::new(ScreenState::Off);
    let sensor = SimSensor::default();

    let service = Service::connect(
        OWN_PACKAGE,
        Collaborators {
            source: Box::new(notifications.clone()),
            settings: Box::new(settings),
            environment: Box::new(environment.clone()),
            renderer: Box::new(ConsoleOverlay),
            sensor: Box::new(sensor.clone()),
        },
    );
    let handle = service.handle();

    let step = Duration::from_millis(400);

    // A message with an explicit green light request
    println!("-- message posted (screen off)");
    notifications.post(record("msg-1", "com.example.chat", "messages", Some(0x0000FF00), 0));
    handle.send(HostEvent::NotificationPosted).await;
    tokio::time::sleep(step).await;

    // Mail requesting a generic white light; its accent decides
    println!("-- mail posted, white light plus accent");
    notifications.post(record("mail-1", "com.example.mail", "inbox", Some(0x00FFFFFF), 0x10A0FF));
    handle.send(HostEvent::NotificationPosted).await;
    tokio::time::sleep(step).await;

    // Do-not-disturb gates everything without dropping tracking
    println!("-- do-not-disturb on, then off");
    environment.set_zen(1);
    handle.send(HostEvent::InterruptionFilterChanged).await;
    tokio::time::sleep(step).await;
    environment.set_zen(0);
    handle.send(HostEvent::InterruptionFilterChanged).await;
    tokio::time::sleep(step).await;

    // An update storm collapses into a single repaint
    println!("-- update storm");
    for n in 0..5 {
        let mut r = record("msg-1", "com.example.chat", "messages", Some(0x0000FF00), 0);
        r.ticker = Some(format!("update {n}"));
        notifications.post(r);
        handle.send(HostEvent::NotificationPosted).await;
    }
    tokio::time::sleep(step).await;

    // Pickup: stationary long enough, then movement
    println!("-- pickup (sensor running: {})", sensor.is_running());
    handle
        .send(HostEvent::Motion {
            state: MotionState::Stationary,
            for_ms: 12_000,
        })
        .await;
    handle
        .send(HostEvent::Motion {
            state: MotionState::Moving,
            for_ms: 0,
        })
        .await;
    tokio::time::sleep(step).await;

    // Unlock; everything marked seen drains after the timeout
    println!("-- unlock");
    environment.set_screen(ScreenState::On);
    environment.set_locked(false);
    handle.send(HostEvent::ScreenOn).await;
    handle.send(HostEvent::UserPresent).await;
    tokio::time::sleep(step).await;

    println!("-- waiting out the seen-timeout");
    environment.set_screen(ScreenState::Off);
    handle.send(HostEvent::ScreenOff).await;
    tokio::time::sleep(Duration::from_millis(cli.seen_timeout_ms.max(0) as u64 + 500)).await;

    println!("-- dismissing the rest");
    notifications.dismiss("msg-1");
    notifications.dismiss("mail-1");
    handle.send(HostEvent::NotificationRemoved).await;
    tokio::time::sleep(step).await;

    let colors = handle.current_colors().await;
    println!("final color set: {colors:?}");
    service.shutdown().await;
}
