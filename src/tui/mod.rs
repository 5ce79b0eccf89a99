//! Ratatui-based terminal UI.
//!
//! The TUI provides a slider sidebar for the 19 gene expression levels, the
//! current input table, a "Calculate Disease Risk" trigger with the colored
//! result and advice, and the SHAP contribution chart for the current inputs.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Cell, Clear, List, ListItem, Paragraph, Row, Table, Wrap},
    Terminal,
};

use crate::app::pipeline::{assess, Assessment};
use crate::config::RiskConfig;
use crate::domain::{FeatureVector, FEATURE_MAX, FEATURE_MIN};
use crate::error::AppError;
use crate::model::RiskModel;
use crate::plot::{chart_bars, Bar};
use crate::report::format::truncate;

mod plotters_chart;

use plotters_chart::ContributionChart;

/// Slider step sizes cycled with `[` and `]`.
const STEPS: [f64; 5] = [1.0, 10.0, 100.0, 1_000.0, 10_000.0];
const DEFAULT_STEP: usize = 2;
const PAGE_STEPS: f64 = 10.0;
const MAX_CHART_BARS: usize = 10;
const SLIDER_WIDTH: usize = 14;

const TITLE: &str = "Non-small Cell Lung Cancer Risk Prediction Model";
const SUBTITLE: &str =
    "Assessing the Risk of Non-Small Cell Lung Cancer Based on Diabetes-Related Gene Expression Levels.";
const SLIDERS_TITLE: &str = "Gene Expression Level Settings";

/// Start the TUI.
pub fn run(model: &RiskModel, config: &RiskConfig) -> Result<(), AppError> {
    let mut app = App::new(model, config.chart_path.clone())?;

    let _guard = TerminalGuard::new()?;
    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal =
        Terminal::new(backend).map_err(|e| AppError::runtime(format!("Failed to initialize terminal: {e}")))?;

    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::runtime(format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::runtime(format!("Failed to enter alternate screen: {e}")));
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

struct App<'a> {
    model: &'a RiskModel,
    chart_path: PathBuf,
    features: FeatureVector,
    selected: usize,
    step_index: usize,
    editing: bool,
    edit_input: String,
    show_result: bool,
    assessment: Assessment,
    bars: Vec<Bar>,
    status: String,
}

impl<'a> App<'a> {
    fn new(model: &'a RiskModel, chart_path: PathBuf) -> Result<Self, AppError> {
        let features = model.schema().default_vector();
        let assessment = assess(model, &features)?;
        let bars = chart_bars(&assessment.attribution, MAX_CHART_BARS);
        Ok(Self {
            model,
            chart_path,
            features,
            selected: 0,
            step_index: DEFAULT_STEP,
            editing: false,
            edit_input: String::new(),
            show_result: false,
            assessment,
            bars,
            status: "Adjust the sliders, then press c to calculate.".to_string(),
        })
    }

    fn event_loop<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::runtime(format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::runtime(format!("Event poll error: {e}")))?
            {
                continue;
            }

            match event::read().map_err(|e| AppError::runtime(format!("Event read error: {e}")))? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key.code)? {
                        break;
                    }
                    needs_redraw = true;
                }
                Event::Resize(_, _) => {
                    needs_redraw = true;
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn handle_key(&mut self, code: KeyCode) -> Result<bool, AppError> {
        if self.editing {
            return self.handle_value_edit(code);
        }

        match code {
            KeyCode::Char('q') | KeyCode::Esc => return Ok(true),
            KeyCode::Up => {
                self.selected = self.selected.saturating_sub(1);
            }
            KeyCode::Down => {
                if self.selected + 1 < self.features.len() {
                    self.selected += 1;
                }
            }
            KeyCode::Left => self.nudge(-1.0)?,
            KeyCode::Right => self.nudge(1.0)?,
            KeyCode::PageDown => self.nudge(-PAGE_STEPS)?,
            KeyCode::PageUp => self.nudge(PAGE_STEPS)?,
            KeyCode::Home => self.set_selected(FEATURE_MIN)?,
            KeyCode::End => self.set_selected(FEATURE_MAX)?,
            KeyCode::Char('[') => {
                self.step_index = prev_step(self.step_index);
                self.status = format!("step: {}", format_value(STEPS[self.step_index]));
            }
            KeyCode::Char(']') => {
                self.step_index = next_step(self.step_index);
                self.status = format!("step: {}", format_value(STEPS[self.step_index]));
            }
            KeyCode::Enter => {
                self.editing = true;
                self.edit_input = format_value(self.selected_value());
                self.status = format!(
                    "Editing {} (0 to 100000). Enter to apply, Esc to cancel.",
                    self.selected_name()
                );
            }
            KeyCode::Char('r') => {
                self.features = self.model.schema().default_vector();
                self.inputs_changed()?;
                self.status = "Restored default expression levels.".to_string();
            }
            KeyCode::Char('c') => {
                self.show_result = true;
                let p = &self.assessment.prediction;
                self.status = format!("{:.2}% -> {}", p.percent, p.level.label());
            }
            KeyCode::Char('s') => self.save_chart(),
            _ => {}
        }

        Ok(false)
    }

    fn handle_value_edit(&mut self, code: KeyCode) -> Result<bool, AppError> {
        match code {
            KeyCode::Esc => {
                self.editing = false;
                self.status = "Edit canceled.".to_string();
            }
            KeyCode::Enter => {
                self.editing = false;
                match parse_level(&self.edit_input) {
                    Some(value) => self.set_selected(value)?,
                    None => {
                        self.status = format!("Invalid expression level '{}'.", self.edit_input.trim());
                    }
                }
            }
            KeyCode::Backspace => {
                self.edit_input.pop();
            }
            KeyCode::Char(c) => {
                if c.is_ascii_digit() || c == '.' {
                    self.edit_input.push(c);
                }
            }
            _ => {}
        }
        Ok(false)
    }

    fn selected_value(&self) -> f64 {
        self.features.get(self.selected).unwrap_or(FEATURE_MIN)
    }

    fn selected_name(&self) -> &str {
        self.model.schema().name(self.selected).unwrap_or("?")
    }

    fn nudge(&mut self, steps: f64) -> Result<(), AppError> {
        let value = self.selected_value() + steps * STEPS[self.step_index];
        self.set_selected(value)
    }

    fn set_selected(&mut self, value: f64) -> Result<(), AppError> {
        let before = self.selected_value();
        self.features.set(self.selected, value);
        let after = self.selected_value();
        self.status = format!("{} = {}", self.selected_name(), format_value(after));
        if after != before {
            self.inputs_changed()?;
        }
        Ok(())
    }

    /// Any input change hides the result panel and recomputes the explanation.
    fn inputs_changed(&mut self) -> Result<(), AppError> {
        self.show_result = false;
        self.assessment = assess(self.model, &self.features)?;
        self.bars = chart_bars(&self.assessment.attribution, MAX_CHART_BARS);
        Ok(())
    }

    fn save_chart(&mut self) {
        match crate::plot::write_attribution_svg(&self.chart_path, &self.assessment.attribution, crate::plot::SVG_SIZE)
        {
            Ok(()) => {
                log::info!("wrote explanation chart to {}", self.chart_path.display());
                self.status = format!("Saved chart: {}", self.chart_path.display());
            }
            Err(err) => {
                log::warn!("chart save failed: {err}");
                self.status = format!("Chart save failed: {err}");
            }
        }
    }

    fn draw(&self, frame: &mut ratatui::Frame<'_>) {
        let size = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(5), Constraint::Min(0), Constraint::Length(3)])
            .split(size);

        self.draw_header(frame, chunks[0]);
        self.draw_body(frame, chunks[1]);
        self.draw_footer(frame, chunks[2]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let p = Paragraph::new(Text::from(self.header_lines())).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn header_lines(&self) -> Vec<Line<'static>> {
        vec![
            Line::from(Span::styled(
                TITLE,
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            )),
            Line::from(SUBTITLE),
            Line::from(Span::styled(
                format!(
                    "model: {} | step: {} | range: {}..{}",
                    self.model.source().display(),
                    format_value(STEPS[self.step_index]),
                    format_value(FEATURE_MIN),
                    format_value(FEATURE_MAX),
                ),
                Style::default().fg(Color::Gray),
            )),
        ]
    }

    fn draw_body(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(44), Constraint::Min(0)])
            .split(area);

        self.draw_sliders(frame, columns[0]);

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(21), Constraint::Min(0)])
            .split(columns[1]);
        let top = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(30), Constraint::Min(0)])
            .split(rows[0]);

        self.draw_input_table(frame, top[0]);
        self.draw_result(frame, top[1]);
        self.draw_chart(frame, rows[1]);
    }

    fn draw_sliders(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let items: Vec<ListItem> = self
            .model
            .schema()
            .names()
            .iter()
            .zip(self.features.values())
            .map(|(name, &value)| {
                ListItem::new(format!(
                    "{:<13} {} {:>7}",
                    truncate(name, 13),
                    slider_bar(value, SLIDER_WIDTH),
                    format_value(value)
                ))
            })
            .collect();

        let list = List::new(items)
            .block(Block::default().title(SLIDERS_TITLE).borders(Borders::ALL))
            .highlight_style(Style::default().fg(Color::Black).bg(Color::White))
            .highlight_symbol("» ");

        let mut state = ratatui::widgets::ListState::default();
        state.select(Some(self.selected));
        frame.render_stateful_widget(list, area, &mut state);

        if self.editing {
            let hint = Paragraph::new(format!("{}: {}_", self.selected_name(), self.edit_input))
                .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));
            let rect = Rect {
                x: area.x + 2,
                y: area.y + area.height.saturating_sub(2),
                width: area.width.saturating_sub(4),
                height: 1,
            };
            frame.render_widget(Clear, rect);
            frame.render_widget(hint, rect);
        }
    }

    fn draw_input_table(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let max_idx = self.features.argmax();
        let rows: Vec<Row> = self
            .model
            .schema()
            .names()
            .iter()
            .zip(self.features.values())
            .enumerate()
            .map(|(i, (name, &value))| {
                let row = Row::new(vec![Cell::from(truncate(name, 14)), Cell::from(format_value(value))]);
                if Some(i) == max_idx {
                    row.style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
                } else {
                    row
                }
            })
            .collect();

        let table = Table::new(rows, [Constraint::Length(14), Constraint::Min(8)])
            .header(Row::new(vec!["Gene", "Level"]).style(Style::default().fg(Color::Gray)))
            .block(Block::default().title("Input Data").borders(Borders::ALL));
        frame.render_widget(table, area);
    }

    fn draw_result(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let block = Block::default().title("Risk Assessment").borders(Borders::ALL);

        if !self.show_result {
            let p = Paragraph::new("Press c to Calculate Disease Risk.")
                .style(Style::default().fg(Color::Gray))
                .block(block);
            frame.render_widget(p, area);
            return;
        }

        let p = &self.assessment.prediction;
        let (r, g, b) = p.level.rgb();
        let risk_style = Style::default().fg(Color::Rgb(r, g, b)).add_modifier(Modifier::BOLD);
        let lines = vec![
            Line::from(vec![
                Span::raw("Predicted Probability: "),
                Span::styled(format!("{:.2}%", p.percent), risk_style),
            ]),
            Line::from(vec![Span::raw("Risk Level: "), Span::styled(p.level.label(), risk_style)]),
            Line::from(""),
            Line::from(Span::styled("Medical Advice:", Style::default().add_modifier(Modifier::BOLD))),
            Line::from(p.level.advice()),
        ];
        let para = Paragraph::new(Text::from(lines))
            .wrap(Wrap { trim: true })
            .block(block);
        frame.render_widget(para, area);
    }

    fn draw_chart(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let attr = &self.assessment.attribution;
        let title = format!(
            "SHAP Explanation ({}) | base {:+.3} | output {:+.3}",
            self.assessment.prediction.level.label(),
            attr.base_value,
            attr.reconstructed_output()
        );
        let block = Block::default().title(title).borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Clear, inner);

        frame.render_widget(ContributionChart { bars: &self.bars }, inner);
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = "↑/↓ select  ←/→ step  [/] step size  PgUp/PgDn ×10  Home/End min/max  Enter edit  c calculate  r reset  s save  q quit";
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(Color::Yellow)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

fn next_step(index: usize) -> usize {
    (index + 1) % STEPS.len()
}

fn prev_step(index: usize) -> usize {
    (index + STEPS.len() - 1) % STEPS.len()
}

/// Fixed-width gauge for a value in `[FEATURE_MIN, FEATURE_MAX]`.
fn slider_bar(value: f64, width: usize) -> String {
    let u = ((value - FEATURE_MIN) / (FEATURE_MAX - FEATURE_MIN)).clamp(0.0, 1.0);
    let filled = (u * width as f64).round() as usize;
    format!("{}{}", "█".repeat(filled), "·".repeat(width - filled))
}

fn format_value(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.2}")
    }
}

/// Parse an edited level. Out-of-range values are accepted and clamped by the vector.
fn parse_level(input: &str) -> Option<f64> {
    input.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}
