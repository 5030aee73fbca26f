use super::*;
use std::{
    path::Path,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

use image::Rgb;

fn write_test_png(path: &Path, width: u32, height: u32) {
    RgbImage::from_pixel(width, height, Rgb([200, 40, 10]))
        .save(path)
        .expect("write png");
}

struct CountingStream {
    active: bool,
    stops: Arc<AtomicUsize>,
}

#[async_trait]
impl CameraStream for CountingStream {
    async fn grab_frame(&mut self) -> Result<Frame, CameraError> {
        Ok(Frame::new(RgbImage::new(2, 2)))
    }

    fn stop(&mut self) {
        self.active = false;
        self.stops.fetch_add(1, Ordering::SeqCst);
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn label(&self) -> &str {
        "counting"
    }
}

struct CountingConnector {
    stops: Arc<AtomicUsize>,
}

#[async_trait]
impl CameraConnector for CountingConnector {
    async fn open(&self) -> Result<Box<dyn CameraStream>, CameraError> {
        Ok(Box::new(CountingStream {
            active: true,
            stops: Arc::clone(&self.stops),
        }))
    }
}

#[test]
fn encodes_frame_as_jpeg() {
    let frame = Frame::new(RgbImage::from_pixel(8, 6, Rgb([10, 120, 250])));
    let image = frame.encode_jpeg(DEFAULT_JPEG_QUALITY).expect("encode");
    assert_eq!(image.mime_type, "image/jpeg");
    assert_eq!((image.width, image.height), (8, 6));
    assert_eq!(&image.bytes[..2], &[0xff, 0xd8]);
}

#[test]
fn empty_frame_is_rejected() {
    let frame = Frame::new(RgbImage::new(0, 0));
    assert!(matches!(
        frame.encode_jpeg(DEFAULT_JPEG_QUALITY),
        Err(CameraError::EmptyFrame)
    ));
}

#[tokio::test]
async fn file_camera_grabs_decoded_frames() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("face.png");
    write_test_png(&path, 5, 4);

    let connector = FileCamera::new(&path);
    let mut camera = ActiveCamera::acquire(&connector).await.expect("acquire");
    assert!(camera.is_ready());
    let frame = camera.grab_frame().await.expect("frame");
    assert_eq!((frame.width(), frame.height()), (5, 4));
}

#[tokio::test]
async fn missing_file_is_reported_as_unavailable() {
    let dir = tempfile::tempdir().expect("tempdir");
    let connector = FileCamera::new(dir.path().join("absent.png"));
    let err = ActiveCamera::acquire(&connector)
        .await
        .err()
        .expect("acquire should fail");
    assert!(matches!(err, CameraError::Unavailable { .. }));
}

#[tokio::test]
async fn undecodable_file_is_reported_as_unavailable() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("garbage.jpg");
    std::fs::write(&path, b"not an image").expect("write");
    let err = ActiveCamera::acquire(&FileCamera::new(&path))
        .await
        .err()
        .expect("acquire should fail");
    assert!(matches!(err, CameraError::Unavailable { .. }));
}

#[tokio::test]
async fn missing_capture_program_is_reported_as_unavailable() {
    let connector = CommandCamera::new("definitely-not-a-camera-binary-9f3a", Vec::new());
    let err = ActiveCamera::acquire(&connector)
        .await
        .err()
        .expect("acquire should fail");
    match err {
        CameraError::Unavailable { reason } => assert!(reason.contains("not found")),
        other => panic!("unexpected error: {other}"),
    }
}

#[cfg(unix)]
#[tokio::test]
async fn command_camera_reads_frame_from_stdout() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("frame.png");
    write_test_png(&path, 3, 3);

    let connector = CommandCamera::new("cat", vec![path.to_string_lossy().into_owned()]);
    let mut camera = ActiveCamera::acquire(&connector).await.expect("acquire");
    let frame = camera.grab_frame().await.expect("frame");
    assert_eq!((frame.width(), frame.height()), (3, 3));
}

#[cfg(unix)]
#[tokio::test]
async fn failing_capture_command_is_reported_as_unavailable() {
    let connector = CommandCamera::new("false", Vec::new());
    let err = ActiveCamera::acquire(&connector)
        .await
        .err()
        .expect("acquire should fail");
    assert!(matches!(err, CameraError::Unavailable { .. }));
}

#[tokio::test]
async fn dropping_active_camera_stops_stream_once() {
    let stops = Arc::new(AtomicUsize::new(0));
    let connector = CountingConnector {
        stops: Arc::clone(&stops),
    };
    let camera = ActiveCamera::acquire(&connector).await.expect("acquire");
    assert_eq!(stops.load(Ordering::SeqCst), 0);
    camera.release();
    assert_eq!(stops.load(Ordering::SeqCst), 1);
}

#[test]
fn parses_camera_sources() {
    assert_eq!(
        "file:/tmp/me.jpg".parse::<CameraSource>(),
        Ok(CameraSource::File("/tmp/me.jpg".into()))
    );
    assert_eq!(
        "command:fswebcam -q --no-banner -".parse::<CameraSource>(),
        Ok(CameraSource::Command {
            program: "fswebcam".into(),
            args: vec!["-q".into(), "--no-banner".into(), "-".into()],
        })
    );
    assert!("file:".parse::<CameraSource>().is_err());
    assert!("command:   ".parse::<CameraSource>().is_err());
    assert!("/dev/video0".parse::<CameraSource>().is_err());
}

#[test]
fn camera_source_display_round_trips_through_parse() {
    let source = CameraSource::default_device();
    let reparsed: CameraSource = source.to_string().parse().expect("parse");
    assert_eq!(reparsed, source);
}
