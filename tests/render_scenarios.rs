use sn76489::export::{export_song, read_wav_track, ExportConfig};
use sn76489::replayer::{render_batch, RenderConfig, RenderJob, Renderer};
use sn76489::sn76489::constants::MASTER_SILENCE_FLOOR;
use sn76489::sn76489::registers::{attenuation_latch, noise_latch, tone_data, tone_latch, Channel};
use sn76489::sn76489::{master_to_pcm, ClockDivider, NoiseConfig};
use sn76489::vgm_loader::VgmFileLoader;
use sn76489::vgm_parser::{encode_commands, Command, StandardWait, VgmHeader};

/// Clock giving exactly one internal tick per 44.1 kHz sample
const TICK_PER_SAMPLE_CLOCK: u32 = 16 * 44_100;

fn transitions(track: &[i16]) -> usize {
    track.windows(2).filter(|w| w[0] != w[1]).count()
}

fn all_silent() -> Vec<u8> {
    [Channel::Tone1, Channel::Tone2, Channel::Tone3, Channel::Noise]
        .into_iter()
        .map(|ch| attenuation_latch(ch, 15))
        .collect()
}

#[test]
fn silence_stays_at_the_floor() {
    // Periods and noise keep running while every attenuator sits at 15
    let mut first = all_silent();
    first.extend([tone_latch(Channel::Tone1, 3), tone_data(3), noise_latch(0x07)]);
    let frames = vec![first, vec![], vec![], vec![]];

    let pcm = Renderer::new(RenderConfig::default())
        .unwrap()
        .render(&frames)
        .unwrap();
    let ceiling = master_to_pcm(MASTER_SILENCE_FLOOR);
    assert!(!pcm.is_empty());
    assert!(pcm.master.iter().all(|&s| s <= ceiling));
}

#[test]
fn period_one_toggles_every_tick() {
    let frames = vec![vec![
        tone_latch(Channel::Tone1, 1),
        tone_data(1),
        attenuation_latch(Channel::Tone1, 0),
    ]];
    let config = RenderConfig::default().with_chip_clock(TICK_PER_SAMPLE_CLOCK);
    let pcm = Renderer::new(config).unwrap().render(&frames).unwrap();

    assert_eq!(pcm.len(), 735);
    let tail = &pcm.tone0[4..];
    assert!(tail.iter().all(|s| s.abs() == i16::MAX));
    assert_eq!(transitions(tail), tail.len() - 1);
}

#[test]
fn period_one_runs_at_clock_over_twice_the_divider() {
    let frames = vec![vec![
        tone_latch(Channel::Tone1, 1),
        tone_data(1),
        attenuation_latch(Channel::Tone1, 0),
    ]];
    // Each clock gives one internal tick per sample, so a 22050 Hz tone toggles every sample
    for divider in [ClockDivider::Div16, ClockDivider::Div128, ClockDivider::None] {
        let config = RenderConfig::default()
            .with_chip_clock(divider.ratio() * 44_100)
            .with_divider(divider);
        let pcm = Renderer::new(config).unwrap().render(&frames).unwrap();

        assert_eq!(pcm.len(), 735, "{:?}", divider);
        let tail = &pcm.tone0[4..];
        assert_eq!(transitions(tail), tail.len() - 1, "{:?}", divider);
    }
}

#[test]
fn divider_scales_the_tone_frequency() {
    let clock = 128 * 44_100;
    let render = |divider, period| {
        let frames = vec![
            vec![
                tone_latch(Channel::Tone1, period),
                tone_data(period),
                attenuation_latch(Channel::Tone1, 0),
            ],
            vec![],
            vec![],
        ];
        let config = RenderConfig::default()
            .with_chip_clock(clock)
            .with_divider(divider);
        Renderer::new(config).unwrap().render(&frames).unwrap()
    };

    // (divider, period, samples per half cycle), measured over the last frame
    let cases = [
        (ClockDivider::Div128, 16, 16),
        (ClockDivider::Div16, 16, 2),
        (ClockDivider::None, 128, 1),
    ];
    let mut tones = Vec::new();
    for (divider, period, half_cycle) in cases {
        let pcm = render(divider, period);
        assert_eq!(pcm.len(), 735 * 3, "{:?}", divider);
        let tail = &pcm.tone0[735 * 2..];
        let expected = (tail.len() - 1) / half_cycle;
        let measured = transitions(tail);
        assert!(
            measured.abs_diff(expected) <= 1,
            "{:?}: {} transitions, expected about {}",
            divider,
            measured,
            expected
        );
        tones.push(pcm.tone0);
    }
    assert_ne!(tones[0], tones[1]);
}

#[test]
fn divider_mode_decides_what_period_zero_means() {
    let frames = vec![vec![
        tone_latch(Channel::Tone1, 0),
        tone_data(0),
        attenuation_latch(Channel::Tone1, 0),
    ]];
    let render = |divider: ClockDivider| {
        let config = RenderConfig::default()
            .with_chip_clock(divider.ratio() * 44_100)
            .with_divider(divider);
        Renderer::new(config).unwrap().render(&frames).unwrap()
    };

    // Without the divider, zero is forced to one and the tone runs at the top rate
    let undivided = render(ClockDivider::None);
    assert_eq!(transitions(&undivided.tone0[4..]), undivided.len() - 5);

    // With it, zero reloads as 1024 ticks and nothing toggles within one frame
    let divided = render(ClockDivider::Div16);
    assert!(transitions(&divided.tone0[4..]) <= 1);
}

#[test]
fn noise_layout_changes_the_noise_track() {
    let frames = vec![
        vec![noise_latch(0x04), attenuation_latch(Channel::Noise, 0)],
        vec![],
        vec![],
    ];
    let render = |noise| {
        let config = RenderConfig::default().with_noise(noise);
        Renderer::new(config).unwrap().render(&frames).unwrap()
    };
    let ti = render(NoiseConfig::TI);
    let sega = render(NoiseConfig::SEGA);

    assert_eq!(ti.len(), sega.len());
    assert!(transitions(&ti.noise) > 10);
    assert!(transitions(&sega.noise) > 10);
    assert_ne!(ti.noise, sega.noise);
}

#[test]
fn batch_matches_sequential_rendering() {
    let song_a = vec![
        vec![tone_latch(Channel::Tone2, 0x11C), tone_data(0x11C), 0xB1],
        vec![],
    ];
    let song_b = vec![vec![noise_latch(0x05), 0xF3], vec![], vec![0xFF]];
    let jobs = vec![
        RenderJob::new(&song_a, RenderConfig::default()),
        RenderJob::new(&song_b, RenderConfig::default().with_sample_rate(22_050)),
        RenderJob::new(&song_a, RenderConfig::default().loops(0)),
    ];

    let results = render_batch(&jobs);
    assert_eq!(results.len(), 3);
    assert_eq!(results[0].as_ref().unwrap(), &jobs[0].run().unwrap());
    assert_eq!(results[1].as_ref().unwrap(), &jobs[1].run().unwrap());
    assert!(matches!(results[2], Err(sn76489::Sn76489Error::ConfigError(_))));
}

#[test]
fn export_writes_five_tracks_and_a_trace() {
    let mut header = VgmHeader::new(0x150);
    header.sn76489_clock = 3_579_545;
    header.rate = 60;
    header.data_offset = 0x0C;
    header.total_samples = 735 * 3;
    let commands = vec![
        Command::RegisterWrite(tone_latch(Channel::Tone1, 0x0FE)),
        Command::RegisterWrite(tone_data(0x0FE)),
        Command::RegisterWrite(attenuation_latch(Channel::Tone1, 0)),
        Command::WaitStandard(StandardWait::Hz60),
        Command::WaitStandard(StandardWait::Hz60),
        Command::RegisterWrite(attenuation_latch(Channel::Tone1, 15)),
        Command::WaitStandard(StandardWait::Hz60),
        Command::EndOfStream,
    ];
    let mut image = header.to_bytes();
    image.extend(encode_commands(&commands));
    let song = VgmFileLoader::load_from_bytes(&image).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let config = ExportConfig::new(dir.path().join("out"), "tune").with_trace(true);
    let summary = export_song(&song, &config).unwrap();

    assert_eq!(summary.wav_files.len(), 5);
    let tracks = ["master", "tone0", "tone1", "tone2", "noise"];
    for (path, track) in summary.wav_files.iter().zip(tracks) {
        assert_eq!(path, &config.track_path(track));
        let (samples, rate) = read_wav_track(path).unwrap();
        assert_eq!(rate, 44_100);
        assert_eq!(samples.len(), summary.samples);
    }

    let trace = std::fs::read_to_string(summary.trace_file.unwrap()).unwrap();
    assert_eq!(trace.lines().count(), 1 + song.frames.len());
    assert!(trace.lines().nth(3).unwrap().starts_with("2,1,0b1_00_1_1111"));
}
