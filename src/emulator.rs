use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Context;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Alignment, Constraint, Direction, Layout};
use ratatui::style::{Color, Style};
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::clock::MonotonicClock;
use crate::display::{DISPLAY_HEIGHT, DISPLAY_WIDTH};
use crate::machine::Machine;
use crate::snapshot::Snapshot;
use crate::timer::{TIMER_RATE_HZ, TimerDriver};

/// Host configuration, assembled from the command line. Explicit values; no
/// globals.
pub struct Settings {
    pub rom: PathBuf,
    pub ips: u64,
    pub frame_rate: u64,
    pub trace: bool,
}

/// Map the left-hand block of a QWERTY keyboard onto the hex keypad.
/// ```text
/// |1|2|3|C|      |1|2|3|4|
/// |4|5|6|D|  ->  |Q|W|E|R|
/// |7|8|9|E|  ->  |A|S|D|F|
/// |A|0|B|F|      |Z|X|C|V|
/// ```
fn keymap(c: char) -> Option<u8> {
    match c {
        '1' => Some(0x1),
        '2' => Some(0x2),
        '3' => Some(0x3),
        '4' => Some(0xC),
        'q' => Some(0x4),
        'w' => Some(0x5),
        'e' => Some(0x6),
        'r' => Some(0xD),
        'a' => Some(0x7),
        's' => Some(0x8),
        'd' => Some(0x9),
        'f' => Some(0xE),
        'z' => Some(0xA),
        'x' => Some(0x0),
        'c' => Some(0xB),
        'v' => Some(0xF),
        _ => None,
    }
}

/// Terminal front end: owns the machine, the clock, and the frame loop.
pub struct Emulator {
    machine: Machine,
    settings: Settings,
}

impl Emulator {
    pub fn new(settings: Settings) -> Self {
        Emulator {
            machine: Machine::new(),
            settings,
        }
    }

    pub fn run(&mut self) -> anyhow::Result<()> {
        let rom_data = std::fs::read(&self.settings.rom).with_context(|| {
            format!("failed to read program image {}", self.settings.rom.display())
        })?;
        self.machine.load_program(&rom_data);

        let rom_stem = self
            .settings
            .rom
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "vip8".to_string());

        enable_raw_mode()?;
        let backend = CrosstermBackend::new(std::io::stdout());
        let mut terminal = Terminal::new(backend)?;
        terminal.clear()?;

        let result = self.frame_loop(&mut terminal, &rom_stem);
        disable_raw_mode()?;
        result
    }

    fn frame_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
        rom_stem: &str,
    ) -> anyhow::Result<()> {
        let frame_duration = Duration::from_secs_f64(1.0 / self.settings.frame_rate as f64);
        let instructions_per_frame = self.settings.ips / self.settings.frame_rate;

        let clock = MonotonicClock::new();
        let mut driver = TimerDriver::new(TIMER_RATE_HZ, &clock);

        'mainloop: loop {
            let frame_start = Instant::now();

            while event::poll(Duration::ZERO)? {
                if let Event::Key(key) = event::read()? {
                    match key.code {
                        KeyCode::Esc => {
                            terminal.clear()?;
                            break 'mainloop;
                        }
                        KeyCode::Char(c) => {
                            if let Some(k) = keymap(c) {
                                // Release events only arrive on terminals with
                                // the keyboard enhancement protocol
                                if key.kind == KeyEventKind::Release {
                                    self.machine.release_key(k);
                                } else {
                                    self.machine.press_key(k);
                                }
                            }
                        }
                        _ => {}
                    }
                }
            }

            driver.tick(&clock, &mut self.machine.timers);

            for _ in 0..instructions_per_frame {
                self.cycle()?;
            }

            terminal.draw(|frame| self.render(frame, rom_stem))?;
            // No key-up events in raw mode; a key stays down for one frame
            self.machine.keypad.clear();

            let elapsed = frame_start.elapsed();
            if elapsed < frame_duration {
                std::thread::sleep(frame_duration - elapsed);
            }
        }

        Ok(())
    }

    fn cycle(&mut self) -> anyhow::Result<()> {
        if !self.settings.trace {
            return self.machine.step().context("emulation halted");
        }

        let before = Snapshot::capture(&self.machine);
        self.machine.step().context("emulation halted")?;
        for change in before.diff(&Snapshot::capture(&self.machine)) {
            tracing::trace!("{change}");
        }
        Ok(())
    }

    fn render(&self, frame: &mut ratatui::Frame, rom_stem: &str) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(DISPLAY_HEIGHT as u16 + 2),
                Constraint::Length(6),
                Constraint::Min(0),
            ])
            .split(frame.area());

        let mut rows = String::with_capacity((DISPLAY_WIDTH + 1) * DISPLAY_HEIGHT);
        for y in 0..DISPLAY_HEIGHT {
            for x in 0..DISPLAY_WIDTH {
                rows.push(if self.machine.framebuffer.get(x, y) {
                    '█'
                } else {
                    ' '
                });
            }
            rows.push('\n');
        }
        let title = if self.machine.is_awaiting_key() {
            format!("{rom_stem} [waiting for key]")
        } else {
            rom_stem.to_string()
        };
        let screen = Paragraph::new(rows)
            .block(Block::default().borders(Borders::ALL).title(title))
            .style(Style::default().fg(Color::White));
        frame.render_widget(screen, chunks[0]);

        let key_help = "1 2 3 4  ->  1 2 3 C\n\
            Q W E R  ->  4 5 6 D\n\
            A S D F  ->  7 8 9 E\n\
            Z X C V  ->  A 0 B F";
        let keys = Paragraph::new(key_help)
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL).title("Keypad"))
            .style(Style::default().fg(Color::Yellow));
        frame.render_widget(keys, chunks[1]);
    }
}
