use approx::assert_relative_eq;
use dsp_viewer::dsp::{GlobalRegister, VoiceRegister};
use dsp_viewer::presentation::FrameRecorder;
use dsp_viewer::transition_log::MonitorTarget;
use dsp_viewer::{
    CaptureSource, NoteLog, RegisterCapture, RegisterFile, SoundViewer, ViewerConfig,
};
use std::fs;
use std::path::Path;

fn set_voice(regs: &mut RegisterFile, voice: usize, outx: u8, pitch: u16, source: u8) {
    regs.write(VoiceRegister::Output.addr(voice), outx);
    regs.write(VoiceRegister::PitchLow.addr(voice), (pitch & 0xFF) as u8);
    regs.write(VoiceRegister::PitchHigh.addr(voice), (pitch >> 8) as u8);
    regs.write(VoiceRegister::SourceNumber.addr(voice), source);
}

fn config_with_log(path: &Path) -> ViewerConfig {
    ViewerConfig::default().with_log_path(path)
}

fn log_lines(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}

#[test]
fn header_written_when_session_is_created() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.log");
    let _viewer = SoundViewer::new(RegisterFile::new(), FrameRecorder::new(), config_with_log(&path));
    assert_eq!(log_lines(&path), vec!["READY"]);
}

#[test]
fn steady_note_on_monitored_sample_logs_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.log");

    let mut regs = RegisterFile::new();
    set_voice(&mut regs, 0, 100, 0x1000, 14);
    let mut viewer = SoundViewer::new(regs, FrameRecorder::new(), config_with_log(&path));

    viewer.show();
    for _ in 0..4 {
        viewer.run_pass();
    }

    assert_eq!(log_lines(&path), vec!["READY", "SAMPLE 14: 60"]);
    let logged: Vec<bool> = viewer
        .sink()
        .frames()
        .iter()
        .map(|f| f.logged_transition)
        .collect();
    assert_eq!(logged, vec![true, false, false, false, false]);
}

#[test]
fn other_sample_masks_transition_until_note_changes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.log");

    // 4096 * 2^(1/12) ~= 4340 -> note 61
    let mut capture = RegisterCapture::new();
    let mut regs = RegisterFile::new();
    set_voice(&mut regs, 0, 100, 0x1000, 14);
    capture.push(regs.dump_registers());
    set_voice(&mut regs, 0, 100, 4340, 3);
    capture.push(regs.dump_registers());
    set_voice(&mut regs, 0, 100, 4340, 14);
    capture.push(regs.dump_registers());
    set_voice(&mut regs, 0, 100, 0x2000, 14);
    capture.push(regs.dump_registers());

    let mut viewer = SoundViewer::new(
        CaptureSource::new(capture),
        FrameRecorder::new(),
        config_with_log(&path),
    );
    while viewer.source_mut().advance() {
        viewer.run_pass();
    }

    assert_eq!(
        log_lines(&path),
        vec!["READY", "SAMPLE 14: 60", "SAMPLE 14: 72"]
    );
    let log = NoteLog::load(&path).unwrap();
    assert_eq!(log.notes_for(14).collect::<Vec<_>>(), vec![60, 72]);
}

#[test]
fn logging_ignores_silence_gate() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.log");

    let mut regs = RegisterFile::new();
    set_voice(&mut regs, 0, 0, 0x1000, 14);
    let mut viewer = SoundViewer::new(regs, FrameRecorder::new(), config_with_log(&path));
    let frame = viewer.run_pass();

    assert_eq!(frame.channels[0].note, None);
    assert!(frame.logged_transition);
    assert_eq!(log_lines(&path), vec!["READY", "SAMPLE 14: 60"]);
}

#[test]
fn only_monitored_voice_is_logged() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.log");

    let mut regs = RegisterFile::new();
    set_voice(&mut regs, 1, 100, 0x1000, 14);
    let config = config_with_log(&path).with_monitor(Some(MonitorTarget::new(2, 14)));
    let mut viewer = SoundViewer::new(regs, FrameRecorder::new(), config);
    viewer.run_pass();

    assert_eq!(log_lines(&path), vec!["READY"]);
}

#[test]
fn disabled_monitor_touches_no_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.log");

    let mut regs = RegisterFile::new();
    set_voice(&mut regs, 0, 100, 0x1000, 14);
    let config = config_with_log(&path).with_monitor(None);
    let mut viewer = SoundViewer::new(regs, FrameRecorder::new(), config);
    viewer.run_pass();

    assert!(viewer.logger().is_none());
    assert!(!path.exists());
}

#[test]
fn frame_carries_all_derived_signals() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.log");

    let mut regs = RegisterFile::new();
    regs.write(GlobalRegister::MainVolumeLeft.addr(), 127);
    regs.write(GlobalRegister::MainVolumeRight.addr(), 127);
    regs.write(VoiceRegister::VolumeLeft.addr(3), 31);
    regs.write(VoiceRegister::VolumeRight.addr(3), (-31i8) as u8);
    regs.write(GlobalRegister::EchoEnable.addr(), 0x08);
    regs.write(GlobalRegister::NoiseEnable.addr(), 0x08);
    set_voice(&mut regs, 3, 127, 0x0800, 9);
    regs.set_channel_enabled(3, false);

    let mut viewer = SoundViewer::new(regs, FrameRecorder::new(), config_with_log(&path));
    let frame = viewer.run_pass();
    let ch = frame.channels[3];

    assert_eq!(ch.channel, 3);
    assert_relative_eq!(ch.amplitude, 0.25);
    assert_relative_eq!(ch.pan_left, 127.0 * 31.0 / 4096.0);
    assert_relative_eq!(ch.pan_right, ch.pan_left);
    assert_eq!(ch.note, Some(48));
    assert_eq!(ch.sample_source, 9);
    assert!(ch.modes.echo);
    assert!(ch.modes.noise);
    assert!(!ch.modes.pitch_mod);
    assert_eq!(ch.enabled, Some(false));

    for other in frame.channels.iter().filter(|c| c.channel != 3) {
        assert_eq!(other.amplitude, 0.0);
        assert_eq!(other.note, None);
    }
}

#[test]
fn envelope_settles_and_decays() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.log");
    let config = config_with_log(&path).with_monitor(None);

    let mut capture = RegisterCapture::new();
    let mut regs = RegisterFile::new();
    set_voice(&mut regs, 5, 127, 0x1000, 1);
    for _ in 0..40 {
        capture.push(regs.dump_registers());
    }
    set_voice(&mut regs, 5, 0, 0x1000, 1);
    for _ in 0..40 {
        capture.push(regs.dump_registers());
    }

    let mut viewer = SoundViewer::new(CaptureSource::new(capture), FrameRecorder::new(), config);
    while viewer.source_mut().advance() {
        viewer.run_pass();
    }

    let amps: Vec<f64> = viewer
        .sink()
        .frames()
        .iter()
        .map(|f| f.channels[5].amplitude)
        .collect();
    assert_relative_eq!(amps[39], 1.0, epsilon = 1e-4);
    for n in 1..40 {
        assert_relative_eq!(amps[39 + n], amps[39] * 0.75f64.powi(n as i32), epsilon = 1e-12);
    }
    assert!(amps.iter().all(|a| (0.0..=1.0).contains(a)));

    // Note drops out once the envelope falls through the threshold.
    let last = viewer.sink().last().unwrap();
    assert_eq!(last.channels[5].note, None);
}

#[test]
fn capture_round_trips_through_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("capture.bin");

    let mut capture = RegisterCapture::new();
    let mut regs = RegisterFile::new();
    set_voice(&mut regs, 0, 64, 0x1000, 14);
    capture.push(regs.dump_registers());
    capture.save(&path).unwrap();

    let loaded = RegisterCapture::load(&path).unwrap();
    assert_eq!(loaded, capture);
}
