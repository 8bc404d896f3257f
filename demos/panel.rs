use sensor_panel::{Channel, DisplayState, SamplingRate, Start, SubscriptionManager, open};
use tokio::time::{Duration, interval};

fn parse_channel(arg: &str) -> Option<Channel> {
    match arg {
        "proximity" => Some(Channel::Proximity),
        "gyro" => Some(Channel::Gyroscope),
        "rotation" => Some(Channel::RotationVector),
        "accel" => Some(Channel::Accelerometer),
        _ => None,
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let dev = open().await?;
    println!("Panel backend={:?} ({})", dev.info().backend, dev.info().note);

    let mut wanted: Vec<Channel> = std::env::args().skip(1).filter_map(|a| parse_channel(&a)).collect();
    if wanted.is_empty() {
        wanted = Channel::ALL.to_vec();
    }

    let mut panel = SubscriptionManager::new(dev, DisplayState::new()).with_rate(SamplingRate::Ui);
    for c in wanted {
        if panel.start(c) == Start::Unavailable {
            println!("{}: {}", c.label(), sensor_panel::SENSOR_NOT_FOUND);
        }
    }

    // CI mode: exit after a few redraws
    let ci = std::env::var("SENSOR_PANEL_CI").ok().as_deref() == Some("1");
    let json = std::env::var("SENSOR_PANEL_JSON").ok().as_deref() == Some("1");
    let mut redraw = interval(Duration::from_millis(250));
    let mut ticks = 0u32;

    loop {
        tokio::select! {
            update = panel.next_update() => {
                if update.is_none() {
                    println!("(no active sensors)");
                    break;
                }
            }
            _ = redraw.tick() => {
                if json {
                    println!("{}", serde_json::to_string(panel.sink())?);
                } else {
                    print!("{}", panel.sink().render());
                    println!();
                }
                ticks += 1;
                if ci && ticks > 20 {
                    break;
                }
            }
        }
    }
    panel.stop_all();
    Ok(())
}
