use crate::errors::{log_failure, HalError, HalResult};
use crate::pins::{LogicalPin, PwmChannel, PwmTable};
use crate::sysfs::{join, SysfsIo};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

pub const DEFAULT_BASE_PATH: &str = "/sys/class/pwm";
pub const DEFAULT_PERIOD: u32 = 100;

/// One complete output configuration, applied period first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PwmSettings {
    pub period: u32,
    pub duty_cycle: u32,
    pub enabled: bool,
}

impl PwmSettings {
    pub fn new(duty_cycle: u32) -> Self {
        Self {
            period: DEFAULT_PERIOD,
            duty_cycle,
            enabled: true,
        }
    }
}

/// What has been written to a channel since this controller was created.
#[derive(Debug, Default)]
struct ChannelState {
    period: Option<u32>,
}

/// PWM control through `/sys/class/pwm`.
///
/// The kernel rejects a duty cycle larger than the current period, so the
/// controller tracks the period written in this session and refuses duty
/// cycle writes that would fail.
pub struct PwmController {
    base_path: PathBuf,
    io: Arc<dyn SysfsIo>,
    channels: HashMap<PwmChannel, Mutex<ChannelState>>,
}

impl PwmController {
    pub fn new(base_path: impl Into<PathBuf>, io: Arc<dyn SysfsIo>) -> Self {
        let channels = PwmTable::entries()
            .map(|(_, channel)| (channel, Mutex::new(ChannelState::default())))
            .collect();
        Self {
            base_path: base_path.into(),
            io,
            channels,
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    pub fn set_base_path(&mut self, base_path: impl Into<PathBuf>) {
        self.base_path = base_path.into();
        info!("[pwm] base path set to {}", self.base_path.display());
    }

    pub async fn export(&self, pin: LogicalPin) -> HalResult<()> {
        let result = self.write_control(pin, "export").await;
        log_failure("pwm", "export", pin, result)
    }

    pub async fn unexport(&self, pin: LogicalPin) -> HalResult<()> {
        let result = self.write_control(pin, "unexport").await;
        log_failure("pwm", "unexport", pin, result)
    }

    /// Drives `pin` with `duty_cycle` over the default period, enabled.
    pub async fn analog_write(&self, pin: LogicalPin, duty_cycle: u32) -> HalResult<()> {
        self.analog_write_with(pin, PwmSettings::new(duty_cycle)).await
    }

    /// Writes period, then duty cycle, then enable.
    pub async fn analog_write_with(&self, pin: LogicalPin, settings: PwmSettings) -> HalResult<()> {
        let result = self.apply(pin, settings).await;
        log_failure("pwm", "analog_write", pin, result)
    }

    pub async fn set_period(&self, pin: LogicalPin, period: u32) -> HalResult<()> {
        let result = self.write_period(pin, period).await;
        log_failure("pwm", "set_period", pin, result)
    }

    pub async fn set_duty_cycle(&self, pin: LogicalPin, duty_cycle: u32) -> HalResult<()> {
        let result = self.write_duty_cycle(pin, duty_cycle).await;
        log_failure("pwm", "set_duty_cycle", pin, result)
    }

    pub async fn set_enabled(&self, pin: LogicalPin, enabled: bool) -> HalResult<()> {
        let result = self.write_enable(pin, enabled).await;
        log_failure("pwm", "set_enabled", pin, result)
    }

    /// Period last written to `pin` by this controller.
    pub async fn configured_period(&self, pin: LogicalPin) -> HalResult<Option<u32>> {
        let channel = PwmTable::channel(pin)?;
        let state = self.state(channel).lock().await;
        Ok(state.period)
    }

    async fn apply(&self, pin: LogicalPin, settings: PwmSettings) -> HalResult<()> {
        let channel = PwmTable::channel(pin)?;
        if settings.duty_cycle > settings.period {
            return Err(HalError::DutyCycleExceedsPeriod {
                pin,
                duty_cycle: settings.duty_cycle,
                period: settings.period,
            });
        }

        let mut state = self.state(channel).lock().await;
        self.write_attribute(channel, "period", settings.period).await?;
        state.period = Some(settings.period);
        self.write_attribute(channel, "duty_cycle", settings.duty_cycle).await?;
        self.write_attribute(channel, "enable", settings.enabled as u32).await?;
        debug!(
            "[pwm] pin {} period={} duty_cycle={} enabled={}",
            pin, settings.period, settings.duty_cycle, settings.enabled
        );
        Ok(())
    }

    async fn write_period(&self, pin: LogicalPin, period: u32) -> HalResult<()> {
        let channel = PwmTable::channel(pin)?;
        let mut state = self.state(channel).lock().await;
        self.write_attribute(channel, "period", period).await?;
        state.period = Some(period);
        Ok(())
    }

    async fn write_duty_cycle(&self, pin: LogicalPin, duty_cycle: u32) -> HalResult<()> {
        let channel = PwmTable::channel(pin)?;
        let state = self.state(channel).lock().await;
        let period = state.period.ok_or(HalError::PeriodNotConfigured { pin })?;
        if duty_cycle > period {
            return Err(HalError::DutyCycleExceedsPeriod { pin, duty_cycle, period });
        }
        self.write_attribute(channel, "duty_cycle", duty_cycle).await
    }

    async fn write_enable(&self, pin: LogicalPin, enabled: bool) -> HalResult<()> {
        let channel = PwmTable::channel(pin)?;
        let _state = self.state(channel).lock().await;
        self.write_attribute(channel, "enable", enabled as u32).await
    }

    async fn write_control(&self, pin: LogicalPin, file: &str) -> HalResult<()> {
        let channel = PwmTable::channel(pin)?;
        let _state = self.state(channel).lock().await;
        let index = channel.export_index();
        self.io.write(&self.base_path.join(file), &index.to_string()).await?;
        debug!("[pwm] {} pin {} (pwm index {})", file, pin, index);
        Ok(())
    }

    async fn write_attribute(&self, channel: PwmChannel, attribute: &str, value: u32) -> HalResult<()> {
        let path = join(
            &self.base_path,
            &[
                format!("pwmchip{}", channel.chip).as_str(),
                format!("pwm{}", channel.channel).as_str(),
                attribute,
            ],
        );
        self.io.write(&path, &value.to_string()).await
    }

    fn state(&self, channel: PwmChannel) -> &Mutex<ChannelState> {
        // Channels come from PwmTable, which also built the map
        &self.channels[&channel]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sysfs::testing::RecordingSysfs;
    use std::fs;
    use tempfile::TempDir;

    fn pwm_tree() -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("export"), "").unwrap();
        fs::write(dir.path().join("unexport"), "").unwrap();
        for (_, channel) in PwmTable::entries() {
            let pwm_dir = dir
                .path()
                .join(format!("pwmchip{}", channel.chip))
                .join(format!("pwm{}", channel.channel));
            fs::create_dir_all(&pwm_dir).unwrap();
            for attribute in ["period", "duty_cycle", "enable"] {
                fs::write(pwm_dir.join(attribute), "0").unwrap();
            }
        }
        dir
    }

    fn attributes(writes: &[(PathBuf, String)]) -> Vec<(String, String)> {
        writes
            .iter()
            .map(|(path, value)| {
                let name = path.file_name().unwrap().to_string_lossy().into_owned();
                (name, value.clone())
            })
            .collect()
    }

    #[tokio::test]
    async fn test_export_writes_chip_channel_index() {
        let dir = pwm_tree();
        let io = Arc::new(RecordingSysfs::new());
        let pwm = PwmController::new(dir.path(), io.clone());

        pwm.export(3).await.unwrap();
        pwm.export(11).await.unwrap();
        pwm.unexport(10).await.unwrap();

        assert_eq!(
            io.writes(),
            vec![
                (dir.path().join("export"), "0".to_string()),
                (dir.path().join("export"), "6".to_string()),
                (dir.path().join("unexport"), "7".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_analog_write_order() {
        let dir = pwm_tree();
        let io = Arc::new(RecordingSysfs::new());
        let pwm = PwmController::new(dir.path(), io.clone());

        pwm.analog_write(9, 40).await.unwrap();

        let writes = io.writes();
        assert_eq!(
            attributes(&writes),
            vec![
                ("period".to_string(), "100".to_string()),
                ("duty_cycle".to_string(), "40".to_string()),
                ("enable".to_string(), "1".to_string()),
            ]
        );
        assert!(writes[0].0.starts_with(dir.path().join("pwmchip1").join("pwm1")));

        let chip = dir.path().join("pwmchip1").join("pwm1");
        assert_eq!(fs::read_to_string(chip.join("period")).unwrap(), "100");
        assert_eq!(fs::read_to_string(chip.join("duty_cycle")).unwrap(), "40");
        assert_eq!(pwm.configured_period(9).await.unwrap(), Some(100));
    }

    #[tokio::test]
    async fn test_analog_write_with_disabled() {
        let dir = pwm_tree();
        let io = Arc::new(RecordingSysfs::new());
        let pwm = PwmController::new(dir.path(), io.clone());

        let settings = PwmSettings { period: 20_000, duty_cycle: 1_500, enabled: false };
        pwm.analog_write_with(4, settings).await.unwrap();

        assert_eq!(
            attributes(&io.writes()),
            vec![
                ("period".to_string(), "20000".to_string()),
                ("duty_cycle".to_string(), "1500".to_string()),
                ("enable".to_string(), "0".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_duty_cycle_before_period_rejected() {
        let dir = pwm_tree();
        let io = Arc::new(RecordingSysfs::new());
        let pwm = PwmController::new(dir.path(), io.clone());

        let err = pwm.set_duty_cycle(5, 10).await.unwrap_err();
        assert!(matches!(err, HalError::PeriodNotConfigured { pin: 5 }));
        assert!(err.is_validation());
        assert!(io.writes().is_empty());

        pwm.set_period(5, 50).await.unwrap();
        pwm.set_duty_cycle(5, 25).await.unwrap();
        assert!(matches!(
            pwm.set_duty_cycle(5, 60).await,
            Err(HalError::DutyCycleExceedsPeriod { duty_cycle: 60, period: 50, .. })
        ));
        pwm.set_enabled(5, true).await.unwrap();

        assert_eq!(
            attributes(&io.writes()),
            vec![
                ("period".to_string(), "50".to_string()),
                ("duty_cycle".to_string(), "25".to_string()),
                ("enable".to_string(), "1".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_duty_cycle_above_period_rejected_before_any_write() {
        let dir = pwm_tree();
        let io = Arc::new(RecordingSysfs::new());
        let pwm = PwmController::new(dir.path(), io.clone());

        assert!(pwm.analog_write(3, 150).await.is_err());
        assert!(io.writes().is_empty());
        assert_eq!(pwm.configured_period(3).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_failed_period_write_leaves_period_unset() {
        let dir = tempfile::tempdir().unwrap();
        let pwm = PwmController::new(dir.path(), Arc::new(RecordingSysfs::new()));

        assert!(matches!(pwm.analog_write(6, 10).await, Err(HalError::FileAccess { .. })));
        assert_eq!(pwm.configured_period(6).await.unwrap(), None);
        assert!(matches!(
            pwm.set_duty_cycle(6, 10).await,
            Err(HalError::PeriodNotConfigured { .. })
        ));
    }

    #[tokio::test]
    async fn test_unknown_pwm_pin() {
        let dir = pwm_tree();
        let pwm = PwmController::new(dir.path(), Arc::new(RecordingSysfs::new()));

        let err = pwm.export(8).await.unwrap_err();
        assert!(matches!(err, HalError::UnknownPin { kind: "PWM", pin: 8 }));
    }

    #[tokio::test]
    async fn test_set_base_path() {
        let first = pwm_tree();
        let second = pwm_tree();
        let mut pwm = PwmController::new(first.path(), Arc::new(RecordingSysfs::new()));

        pwm.set_base_path(second.path());
        pwm.export(7).await.unwrap();
        assert_eq!(fs::read_to_string(second.path().join("export")).unwrap(), "4");
    }
}
