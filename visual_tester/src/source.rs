// THEORY:
// The sources and sinks that connect the detector to files on disk. A
// `DirectorySource` replays still frames in file-name order, a `VideoSource`
// (with the `opencv` feature) decodes a video, and a `PngSink` writes every
// annotated frame back out as a numbered PNG while echoing the log events.

use std::fs;
use std::path::{Path, PathBuf};

use motion_sentry::core_modules::frame::Frame;
use motion_sentry::driver::{FrameSink, FrameSource};
use motion_sentry::{Error, FrameOutcome, Result};

const IMAGE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// Every PNG/JPEG in one directory, read in lexical order of file name.
pub struct DirectorySource {
    paths: std::vec::IntoIter<PathBuf>,
}

impl DirectorySource {
    pub fn open(dir: &Path) -> Result<Self> {
        let io_err = |source| Error::Io {
            path: dir.to_path_buf(),
            source,
        };
        let mut paths = Vec::new();
        for entry in fs::read_dir(dir).map_err(io_err)? {
            let path = entry.map_err(io_err)?.path();
            if is_image(&path) {
                paths.push(path);
            }
        }
        paths.sort();
        log::info!("found {} frames in {}", paths.len(), dir.display());
        Ok(Self {
            paths: paths.into_iter(),
        })
    }

    pub fn remaining(&self) -> usize {
        self.paths.len()
    }
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}

impl FrameSource for DirectorySource {
    fn read_frame(&mut self) -> Result<Option<Frame>> {
        let Some(path) = self.paths.next() else {
            return Ok(None);
        };
        log::debug!("reading {}", path.display());
        Ok(Some(image::open(&path)?.to_rgb8()))
    }
}

/// Decodes a video file through OpenCV, converting each BGR frame to RGB.
#[cfg(feature = "opencv")]
pub struct VideoSource {
    capture: opencv::videoio::VideoCapture,
}

#[cfg(feature = "opencv")]
impl VideoSource {
    pub fn open(path: &Path) -> Result<Self> {
        use opencv::prelude::*;
        use opencv::videoio::{self, VideoCapture};

        let name = path.to_string_lossy();
        let capture = VideoCapture::from_file(&name, videoio::CAP_ANY).map_err(cv_err)?;
        if !capture.is_opened().map_err(cv_err)? {
            return Err(Error::Source(format!("cannot open video {name}")));
        }
        Ok(Self { capture })
    }
}

#[cfg(feature = "opencv")]
fn cv_err(err: opencv::Error) -> Error {
    Error::Source(err.to_string())
}

#[cfg(feature = "opencv")]
impl FrameSource for VideoSource {
    fn read_frame(&mut self) -> Result<Option<Frame>> {
        use opencv::core::Mat;
        use opencv::imgproc;
        use opencv::prelude::*;

        let mut bgr = Mat::default();
        if !self.capture.read(&mut bgr).map_err(cv_err)? || bgr.empty() {
            return Ok(None);
        }
        let mut rgb = Mat::default();
        imgproc::cvt_color(&bgr, &mut rgb, imgproc::COLOR_BGR2RGB, 0).map_err(cv_err)?;
        let (width, height) = (rgb.cols() as u32, rgb.rows() as u32);
        let data = rgb.data_bytes().map_err(cv_err)?.to_vec();
        Frame::from_raw(width, height, data)
            .map(Some)
            .ok_or_else(|| Error::Source("decoded frame has an unexpected layout".into()))
    }
}

/// Writes each annotated frame as a numbered PNG and prints every log event.
pub struct PngSink {
    dir: PathBuf,
    written: u64,
}

impl PngSink {
    pub fn create(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir).map_err(|source| Error::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        Ok(Self {
            dir: dir.to_path_buf(),
            written: 0,
        })
    }

    pub fn written(&self) -> u64 {
        self.written
    }
}

impl FrameSink for PngSink {
    fn present(&mut self, outcome: &FrameOutcome) -> Result<()> {
        if let Some(event) = &outcome.event {
            println!("{event}");
        }
        self.written += 1;
        let path = self.dir.join(format!("frame_{:06}.png", self.written));
        outcome.annotated.save(&path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use motion_sentry::core_modules::frame::solid_frame;

    #[test]
    fn directory_frames_come_back_sorted() {
        let dir = tempfile::tempdir().unwrap();
        for (name, shade) in [("b.png", 20u8), ("a.png", 10), ("c.PNG", 30)] {
            solid_frame(4, 3, [shade; 3]).save(dir.path().join(name)).unwrap();
        }
        fs::write(dir.path().join("notes.txt"), "not a frame").unwrap();

        let mut source = DirectorySource::open(dir.path()).unwrap();
        assert_eq!(source.remaining(), 3);
        let shades: Vec<u8> = std::iter::from_fn(|| source.read_frame().unwrap())
            .map(|f| f.get_pixel(0, 0).0[0])
            .collect();
        assert_eq!(shades, vec![10, 20, 30]);
    }

    #[test]
    fn sink_numbers_frames_from_one() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = PngSink::create(&dir.path().join("out")).unwrap();
        let outcome = FrameOutcome {
            annotated: solid_frame(4, 4, [1, 2, 3]),
            event: None,
            continue_processing: true,
            object_detected: false,
            detections: Vec::new(),
        };
        sink.present(&outcome).unwrap();
        sink.present(&outcome).unwrap();
        assert_eq!(sink.written(), 2);
        assert!(dir.path().join("out/frame_000002.png").exists());
    }
}
