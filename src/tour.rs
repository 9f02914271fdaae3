//! Guided-tour step sequencer.
//!
//! Each page has a fixed, ordered list of spotlight steps (a target element id
//! plus popover copy). The sequencer is a linear state machine: steps whose
//! target is not present are dropped once at construction time, `next`
//! advances one step, and closing or finishing records a per-tour "seen" flag
//! through an injected flag store so the tour is not shown again.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TourStep {
    pub target: String,
    pub title: String,
    pub body: String,
}

impl TourStep {
    pub fn new(target: &str, title: &str, body: &str) -> Self {
        TourStep {
            target: target.to_owned(),
            title: title.to_owned(),
            body: body.to_owned(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TourState {
    NotStarted,
    Step(usize),
    Finished,
}

/// Where "seen" flags live. The server backs this with the user's
/// `tour_status` JSON column; tests use an in-memory map.
pub trait TourFlags {
    fn is_seen(&self, key: &str) -> bool;
    fn mark_seen(&mut self, key: &str);
}

#[derive(Debug, Default)]
pub struct MemoryFlags(std::collections::HashSet<String>);

impl TourFlags for MemoryFlags {
    fn is_seen(&self, key: &str) -> bool {
        self.0.contains(key)
    }

    fn mark_seen(&mut self, key: &str) {
        self.0.insert(key.to_owned());
    }
}

#[derive(Debug)]
pub struct TourSequencer {
    key: String,
    steps: Vec<TourStep>,
    state: TourState,
}

impl TourSequencer {
    /// Build a sequencer for `steps`, keeping only those whose target the
    /// caller reports as present. The filter runs once here, never per
    /// transition.
    pub fn new<P>(key: &str, steps: Vec<TourStep>, target_present: P) -> Self
    where
        P: Fn(&str) -> bool,
    {
        let steps = steps
            .into_iter()
            .filter(|s| target_present(&s.target))
            .collect();
        TourSequencer {
            key: key.to_owned(),
            steps,
            state: TourState::NotStarted,
        }
    }

    pub fn state(&self) -> TourState {
        self.state
    }

    pub fn current_step(&self) -> Option<&TourStep> {
        match self.state {
            TourState::Step(i) => self.steps.get(i),
            _ => None,
        }
    }

    /// Enter the first step. A tour with no remaining steps finishes
    /// immediately.
    pub fn start(&mut self, flags: &mut dyn TourFlags) {
        if self.steps.is_empty() {
            self.finish(flags);
        } else {
            self.state = TourState::Step(0);
        }
    }

    /// Advance one step; on the last step this finishes the tour.
    pub fn next(&mut self, flags: &mut dyn TourFlags) {
        match self.state {
            TourState::Step(i) if i + 1 < self.steps.len() => {
                self.state = TourState::Step(i + 1);
            }
            TourState::Step(_) => self.finish(flags),
            _ => {}
        }
    }

    /// Explicit close from any point: jump straight to `Finished` and persist
    /// the seen flag so the tour is not re-shown.
    pub fn close(&mut self, flags: &mut dyn TourFlags) {
        self.finish(flags);
    }

    fn finish(&mut self, flags: &mut dyn TourFlags) {
        self.state = TourState::Finished;
        flags.mark_seen(&self.key);
    }
}

pub fn tour_by_key(key: &str) -> Option<Vec<TourStep>> {
    match key {
        "dashboard" => Some(dashboard_steps()),
        "active_quiz" => Some(active_quiz_steps()),
        "quiz_results" => Some(quiz_results_steps()),
        _ => None,
    }
}

/// The tour catalog, keyed by route path the way the frontend requests them.
pub fn tour_for_path(path: &str) -> Option<(&'static str, Vec<TourStep>)> {
    if path == "/" || path == "/dashboard" || path == "/admin/AdminDashboard" {
        Some(("dashboard", dashboard_steps()))
    } else if path.starts_with("/quiz/") {
        Some(("active_quiz", active_quiz_steps()))
    } else if path.starts_with("/results/") {
        Some(("quiz_results", quiz_results_steps()))
    } else {
        None
    }
}

fn dashboard_steps() -> Vec<TourStep> {
    vec![
        TourStep::new(
            "#tour-welcome",
            "Bienvenido",
            "Aquí puedes ver cuantos Créditos de Pistas te quedan y la alerta de tus Actividades Pendientes",
        ),
        TourStep::new(
            "#tour-pending",
            "Actividades Pendientes",
            "Aquí verás los cuestionarios asignados. Mini es la versión corta y Normal la completa.",
        ),
        TourStep::new(
            "#tour-quiz-list",
            "Materias Disponibles",
            "Explora por materias y entrena para prepararte para tus exámenes",
        ),
        TourStep::new(
            "#tour-stats",
            "Tu Progreso",
            "Visualiza tu avance general y por categorías. ¡Mantén esas barras llenas!",
        ),
    ]
}

fn active_quiz_steps() -> Vec<TourStep> {
    vec![
        TourStep::new(
            "#tour-quiz-navigation",
            "Navegación",
            "Usa estos círculos para moverte entre las preguntas. Blanco = Actual, Verde = Correcta, Rojo = Errada",
        ),
        TourStep::new(
            "#tour-hint-button",
            "¿Necesitas Ayuda?",
            "Si te atascas, usa este botón para pedir una pista. Consumirá tus créditos.",
        ),
        TourStep::new(
            "#tour-timer",
            "Tiempo Restante",
            "Mantén un ojo en el reloj. ¡Administra bien tu tiempo!",
        ),
    ]
}

fn quiz_results_steps() -> Vec<TourStep> {
    vec![
        TourStep::new(
            "#tour-score-summary",
            "Resumen de Resultados",
            "Aquí ves tu puntuación final, aciertos y tiempo. ¡Intenta mejorar en cada intento!",
        ),
        TourStep::new(
            "#tour-explanation-button",
            "Entiende tus Errores",
            "En las preguntas incorrectas, haz clic aquí para recibir una explicación paso a paso.",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_present(_: &str) -> bool {
        true
    }

    #[test]
    fn walks_every_step_then_finishes_and_marks_seen() {
        let (key, steps) = tour_for_path("/dashboard").unwrap();
        let total = steps.len();
        let mut flags = MemoryFlags::default();
        let mut tour = TourSequencer::new(key, steps, all_present);

        assert_eq!(tour.state(), TourState::NotStarted);
        tour.start(&mut flags);
        for i in 0..total {
            assert_eq!(tour.state(), TourState::Step(i));
            assert!(tour.current_step().is_some());
            tour.next(&mut flags);
        }
        assert_eq!(tour.state(), TourState::Finished);
        assert!(flags.is_seen("dashboard"));
    }

    #[test]
    fn absent_targets_are_dropped_at_construction() {
        let (key, steps) = tour_for_path("/quiz/42").unwrap();
        let mut flags = MemoryFlags::default();
        let mut tour = TourSequencer::new(key, steps, |t| t != "#tour-hint-button");

        tour.start(&mut flags);
        assert_eq!(tour.current_step().unwrap().target, "#tour-quiz-navigation");
        tour.next(&mut flags);
        assert_eq!(tour.current_step().unwrap().target, "#tour-timer");
        tour.next(&mut flags);
        assert_eq!(tour.state(), TourState::Finished);
    }

    #[test]
    fn close_finishes_early_and_persists_flag() {
        let (key, steps) = tour_for_path("/results/10").unwrap();
        let mut flags = MemoryFlags::default();
        let mut tour = TourSequencer::new(key, steps, all_present);

        tour.start(&mut flags);
        tour.close(&mut flags);
        assert_eq!(tour.state(), TourState::Finished);
        assert!(flags.is_seen("quiz_results"));
        // Further transitions are no-ops.
        tour.next(&mut flags);
        assert_eq!(tour.state(), TourState::Finished);
    }

    #[test]
    fn empty_tour_finishes_on_start() {
        let mut flags = MemoryFlags::default();
        let mut tour = TourSequencer::new("empty", dashboard_steps(), |_| false);
        tour.start(&mut flags);
        assert_eq!(tour.state(), TourState::Finished);
        assert!(flags.is_seen("empty"));
    }

    #[test]
    fn unknown_path_has_no_tour() {
        assert!(tour_for_path("/profile").is_none());
    }
}
