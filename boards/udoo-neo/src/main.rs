use neo_hal::{AdcChannel, Board};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    neo_hal::init_tracing();

    let config_path = neo_hal_udoo_neo::get_config_path();
    info!(
        "[{}] Configuration path: {}",
        neo_hal_udoo_neo::BOARD_NAME,
        config_path
    );
    let config = neo_hal_udoo_neo::load_config_from(&config_path)?;

    let board = Board::open(&config).await?;

    let exported = board.gpio.export_all().await;
    for (pin, e) in &exported.failures {
        warn!("[main] pin {} not exported: {}", pin, e);
    }

    match board.temperature.get_temperature().await {
        Ok(celsius) => info!("Temperature {} °C", celsius),
        Err(e) => error!("[main] temperature: {}", e),
    }

    match board.light.get_visible_spectrum().await {
        Ok(visible) => info!("Visible {}", visible),
        Err(e) => error!("[main] light: {}", e),
    }
    match board.light.get_infrared_spectrum().await {
        Ok(infrared) => info!("IR {}", infrared),
        Err(e) => error!("[main] light: {}", e),
    }
    match board.light.get_full_spectrum().await {
        Ok(full) => info!("Full spectrum {}", full),
        Err(e) => error!("[main] light: {}", e),
    }

    match board.barometric.get_altitude().await {
        Ok(meters) => info!("Altitude {} m", meters),
        Err(e) => error!("[main] altitude: {}", e),
    }
    match board.barometric.get_pressure().await {
        Ok(kpa) => info!("Pressure {} kPa", kpa),
        Err(e) => error!("[main] pressure: {}", e),
    }
    match board.barometric.get_temperature().await {
        Ok(celsius) => info!("Temperature {} °C", celsius),
        Err(e) => error!("[main] barometric temperature: {}", e),
    }

    for channel in AdcChannel::ALL {
        match board.analog.analog_read(channel).await {
            Ok(raw) => info!("ADC {:?} {}", channel, raw),
            Err(e) => error!("[main] adc {:?}: {}", channel, e),
        }
    }

    Ok(())
}
