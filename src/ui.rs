//! Interface de terminal do hive-rounds: tabelas de visitas e barra de progresso.
//!
//! Usa as crates `indicatif` para a barra de progresso e `console` para
//! estilização com cores. O [`SessionView`] mostra uma sessão, a visita atual
//! e a estimativa de tempo restante.

use console::Style;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use hive_rounds::workflow::{BatchSession, ProgressSnapshot, SessionStatus, VisitStatus};

/// Renderização colorida de sessões no terminal.
pub struct SessionView {
    // Estilo verde para itens concluídos.
    green: Style,
    // Estilo vermelho para itens cancelados.
    red: Style,
    // Estilo amarelo para itens pendentes.
    yellow: Style,
    // Estilo ciano em negrito para destaques.
    accent: Style,
}

impl Default for SessionView {
    fn default() -> Self {
        Self {
            green: Style::new().green().bold(),
            red: Style::new().red().bold(),
            yellow: Style::new().yellow(),
            accent: Style::new().cyan().bold(),
        }
    }
}

impl SessionView {
    fn session_style(&self, status: SessionStatus) -> &Style {
        match status {
            SessionStatus::Completed => &self.green,
            SessionStatus::Cancelled => &self.red,
            SessionStatus::Draft | SessionStatus::InProgress => &self.yellow,
        }
    }

    fn visit_style(&self, status: VisitStatus) -> &Style {
        match status {
            VisitStatus::Completed => &self.green,
            VisitStatus::Cancelled => &self.red,
            VisitStatus::Pending => &self.yellow,
        }
    }

    /// Uma linha por sessão, usada pelo comando `list`.
    pub fn print_summary(&self, session: &BatchSession) {
        println!(
            "{}  {:<12} {:<24} apiary={} hives={}",
            session.id,
            self.session_style(session.status).apply_to(session.status),
            session.name,
            session.site_group_id,
            session.visits.len()
        );
    }

    /// Cabeçalho da sessão seguido da tabela de visitas em ordem.
    pub fn print_session(&self, session: &BatchSession) {
        println!(
            "{} {} [{}]",
            self.accent.apply_to(&session.name),
            session.id,
            self.session_style(session.status).apply_to(session.status)
        );
        println!("  apiary: {}", session.site_group_id);
        if let Some(started) = session.started_at {
            println!("  started: {}", started.to_rfc3339());
        }
        if let Some(completed) = session.completed_at {
            println!("  finished: {}", completed.to_rfc3339());
        }
        println!();

        let current = session.current_visit().map(|v| v.id);
        for (i, visit) in session.navigator().ordered().iter().enumerate() {
            let marker = if Some(visit.id) == current { "→" } else { " " };
            let skips = if visit.skip_count > 0 {
                format!(" skipped×{}", visit.skip_count)
            } else {
                String::new()
            };
            let record = visit
                .record_id
                .as_deref()
                .map(|r| format!(" record={r}"))
                .unwrap_or_default();
            println!(
                " {marker} {:>3}. {:<16} {:<10} {}{record}{skips}",
                i + 1,
                visit.site_id,
                self.visit_style(visit.status).apply_to(visit.status),
                visit.id
            );
        }
    }

    /// Mostra qual colmeia é a próxima, no formato "hive 3 of 10".
    pub fn print_current(&self, session: &BatchSession) {
        match session.current_visit() {
            Some(visit) => {
                let position = session.position_of(visit.id).unwrap_or_default();
                println!(
                    "  {} hive {} ({position} of {})",
                    self.accent.apply_to("Next:"),
                    visit.site_id,
                    session.visits.len()
                );
            }
            None => println!("  {} no pending hives", self.green.apply_to("✓")),
        }
    }

    /// Barra de progresso (concluídas/total) e estimativas de tempo.
    pub fn print_progress(&self, progress: &ProgressSnapshot) {
        let pb = ProgressBar::with_draw_target(
            Some(progress.total as u64),
            ProgressDrawTarget::stdout(),
        );
        pb.set_style(
            ProgressStyle::with_template("{bar:30.green/white} {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("##-"),
        );
        pb.set_position(progress.completed as u64);
        pb.set_message(format!(
            "completed, {} cancelled, {} pending",
            progress.cancelled, progress.pending
        ));
        pb.abandon();

        println!("  elapsed:   {}", format_minutes(progress.elapsed_minutes));
        println!("  per hive:  {}", format_minutes(progress.average_minutes_per_hive));
        println!(
            "  remaining: {}",
            self.accent
                .apply_to(format_minutes(progress.estimated_remaining_minutes))
        );
    }
}

fn format_minutes(minutes: Option<f64>) -> String {
    match minutes {
        Some(m) if m >= 60.0 => {
            let whole = m.round() as i64;
            format!("{}h {:02}m", whole / 60, whole % 60)
        }
        Some(m) => format!("{m:.1} min"),
        None => "n/a".to_string(),
    }
}
