use crate::errors::{HalError, HalResult};
use crate::sysfs::{join, parse_int, SysfsIo};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// IIO devices as seen on the board itself.
pub const HOST_BASE_PATH: &str = "/sys/bus/iio/devices";
/// Where the IIO tree is mounted inside the application container.
pub const CONTAINER_BASE_PATH: &str = "/var/adc";
pub const DEFAULT_BURST_SIZE: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdcChannel {
    A0,
    A1,
    A2,
    A3,
    A4,
    A5,
}

impl AdcChannel {
    pub const ALL: [AdcChannel; 6] = [
        AdcChannel::A0,
        AdcChannel::A1,
        AdcChannel::A2,
        AdcChannel::A3,
        AdcChannel::A4,
        AdcChannel::A5,
    ];

    /// (IIO device, raw attribute) relative to the base path.
    fn location(&self) -> (&'static str, &'static str) {
        match self {
            AdcChannel::A0 => ("iio:device0", "in_voltage0_raw"),
            AdcChannel::A1 => ("iio:device0", "in_voltage1_raw"),
            AdcChannel::A2 => ("iio:device0", "in_voltage2_raw"),
            AdcChannel::A3 => ("iio:device0", "in_voltage3_raw"),
            AdcChannel::A4 => ("iio:device1", "in_voltage0_raw"),
            AdcChannel::A5 => ("iio:device1", "in_voltage1_raw"),
        }
    }

    fn index(&self) -> usize {
        *self as usize
    }
}

fn channel_paths(base_path: &Path) -> [PathBuf; 6] {
    AdcChannel::ALL.map(|channel| {
        let (device, attribute) = channel.location();
        join(base_path, &[device, attribute])
    })
}

/// Raw sample access to the six ADC inputs.
pub struct AnalogReader {
    base_path: PathBuf,
    paths: [PathBuf; 6],
    burst_size: usize,
    io: Arc<dyn SysfsIo>,
}

impl AnalogReader {
    pub fn new(base_path: impl Into<PathBuf>, burst_size: usize, io: Arc<dyn SysfsIo>) -> Self {
        let base_path = base_path.into();
        let paths = channel_paths(&base_path);
        Self { base_path, paths, burst_size, io }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Moves all six channels under a new base directory.
    pub fn set_base_path(&mut self, base_path: impl Into<PathBuf>) {
        self.base_path = base_path.into();
        self.paths = channel_paths(&self.base_path);
        info!("[adc] base path set to {}", self.base_path.display());
    }

    pub fn burst_size(&self) -> usize {
        self.burst_size
    }

    pub fn channel_path(&self, channel: AdcChannel) -> &Path {
        &self.paths[channel.index()]
    }

    /// Resolves a path to one of the six channels under the current base path.
    pub fn channel_for_path(&self, path: &Path) -> HalResult<AdcChannel> {
        AdcChannel::ALL
            .into_iter()
            .find(|channel| self.channel_path(*channel) == path)
            .ok_or_else(|| {
                let err = HalError::UnknownChannel { path: path.to_path_buf() };
                error!("[adc] {}", err);
                err
            })
    }

    /// Reads one raw sample.
    pub async fn analog_read(&self, channel: AdcChannel) -> HalResult<i64> {
        let path = self.channel_path(channel);
        let result = match self.io.read(path).await {
            Ok(content) => parse_int(path, &content),
            Err(e) => Err(e),
        };
        match &result {
            Ok(value) => debug!("[adc] {:?} = {}", channel, value),
            Err(e) => warn!("[adc] {:?} read failed: {}", channel, e),
        }
        result
    }

    /// Reads one raw sample from a channel given by its file path.
    pub async fn read_path(&self, path: &Path) -> HalResult<i64> {
        let channel = self.channel_for_path(path)?;
        self.analog_read(channel).await
    }

    /// Back-to-back samples for software oversampling. `size` defaults to the
    /// configured burst size.
    pub async fn read_burst(&self, channel: AdcChannel, size: Option<usize>) -> HalResult<Vec<i64>> {
        let size = size.unwrap_or(self.burst_size);
        let mut samples = Vec::with_capacity(size);
        for _ in 0..size {
            samples.push(self.analog_read(channel).await?);
        }
        Ok(samples)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sysfs::Sysfs;
    use std::fs;
    use tempfile::TempDir;

    fn iio_tree(values: [&str; 6]) -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        for (channel, value) in AdcChannel::ALL.into_iter().zip(values) {
            let (device, attribute) = channel.location();
            fs::create_dir_all(dir.path().join(device)).unwrap();
            fs::write(dir.path().join(device).join(attribute), value).unwrap();
        }
        dir
    }

    fn reader(dir: &TempDir) -> AnalogReader {
        AnalogReader::new(dir.path(), DEFAULT_BURST_SIZE, Arc::new(Sysfs::default()))
    }

    #[test]
    fn test_channel_layout() {
        let adc = AnalogReader::new(HOST_BASE_PATH, DEFAULT_BURST_SIZE, Arc::new(Sysfs::default()));
        assert_eq!(
            adc.channel_path(AdcChannel::A0),
            Path::new("/sys/bus/iio/devices/iio:device0/in_voltage0_raw")
        );
        assert_eq!(
            adc.channel_path(AdcChannel::A3),
            Path::new("/sys/bus/iio/devices/iio:device0/in_voltage3_raw")
        );
        assert_eq!(
            adc.channel_path(AdcChannel::A5),
            Path::new("/sys/bus/iio/devices/iio:device1/in_voltage1_raw")
        );
    }

    #[tokio::test]
    async fn test_analog_read_parses_value() {
        let dir = iio_tree(["512\n", "0\n", "4095\n", "1\n", "2\n", "3\n"]);
        let adc = reader(&dir);

        assert_eq!(adc.analog_read(AdcChannel::A0).await.unwrap(), 512);
        assert_eq!(adc.analog_read(AdcChannel::A2).await.unwrap(), 4095);
        assert_eq!(adc.analog_read(AdcChannel::A5).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_set_base_path_rederives_channels() {
        let first = iio_tree(["512", "0", "0", "0", "0", "0"]);
        let second = iio_tree(["100", "0", "0", "0", "0", "0"]);
        let mut adc = reader(&first);
        assert_eq!(adc.analog_read(AdcChannel::A0).await.unwrap(), 512);

        adc.set_base_path(second.path());
        assert_eq!(adc.base_path(), second.path());
        assert_eq!(adc.analog_read(AdcChannel::A0).await.unwrap(), 100);
        assert!(adc.channel_path(AdcChannel::A4).starts_with(second.path()));
    }

    #[tokio::test]
    async fn test_read_path_validates_channel() {
        let dir = iio_tree(["7", "0", "0", "0", "0", "0"]);
        let adc = reader(&dir);

        let a0 = adc.channel_path(AdcChannel::A0).to_path_buf();
        assert_eq!(adc.read_path(&a0).await.unwrap(), 7);

        let bogus = dir.path().join("iio:device0").join("in_voltage7_raw");
        let err = adc.read_path(&bogus).await.unwrap_err();
        assert!(matches!(err, HalError::UnknownChannel { .. }));
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn test_stale_path_rejected_after_base_change() {
        let dir = iio_tree(["7", "0", "0", "0", "0", "0"]);
        let mut adc = reader(&dir);
        let old = adc.channel_path(AdcChannel::A0).to_path_buf();

        adc.set_base_path(CONTAINER_BASE_PATH);
        assert!(adc.channel_for_path(&old).is_err());
    }

    #[tokio::test]
    async fn test_garbage_is_parse_error() {
        let dir = iio_tree(["n/a", "0", "0", "0", "0", "0"]);
        let adc = reader(&dir);

        match adc.analog_read(AdcChannel::A0).await {
            Err(HalError::Parse { content, .. }) => assert_eq!(content, "n/a"),
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_channel_is_file_access() {
        let dir = tempfile::tempdir().unwrap();
        let adc = reader(&dir);

        assert!(matches!(
            adc.analog_read(AdcChannel::A1).await,
            Err(HalError::FileAccess { .. })
        ));
    }

    #[tokio::test]
    async fn test_read_burst() {
        let dir = iio_tree(["0", "0", "0", "0", "321", "0"]);
        let adc = AnalogReader::new(dir.path(), 16, Arc::new(Sysfs::default()));

        let samples = adc.read_burst(AdcChannel::A4, None).await.unwrap();
        assert_eq!(samples, vec![321; 16]);

        let samples = adc.read_burst(AdcChannel::A4, Some(3)).await.unwrap();
        assert_eq!(samples.len(), 3);
        assert!(adc.read_burst(AdcChannel::A4, Some(0)).await.unwrap().is_empty());
    }
}
