// Booking wizard state machine
// Four sequential steps: logistics -> legal agreement -> payment -> confirmed.
// Forward transitions are guard-gated, payment is a simulated async operation
// with a fixed delay, and the confirmed booking is emitted to a ledger trait.

use async_trait::async_trait;
use chrono::NaiveDate;
use parking_lot::Mutex;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;

pub const PAYMENT_DELAY: Duration = Duration::from_millis(2500);

const REFERENCE_PREFIX: &str = "KZ";
const REFERENCE_LEN: usize = 8;
const REFERENCE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum BookingStep {
    Logistics,
    LegalAgreement,
    Payment,
    Confirmed,
}

impl BookingStep {
    pub fn number(self) -> u8 {
        match self {
            BookingStep::Logistics => 1,
            BookingStep::LegalAgreement => 2,
            BookingStep::Payment => 3,
            BookingStep::Confirmed => 4,
        }
    }
}

#[derive(Debug, Clone)]
pub struct WizardConfig {
    pub payment_delay: Duration,
}

impl Default for WizardConfig {
    fn default() -> Self {
        Self {
            payment_delay: PAYMENT_DELAY,
        }
    }
}

// Tour inputs for one session; immutable for the session's life
#[derive(Debug, Clone)]
pub struct TourContext {
    pub tour_name: String,
    pub price_per_person: f64,
}

// Emitted to the booking ledger when a session reaches Confirmed
#[derive(Debug, Clone, PartialEq)]
pub struct BookingRecord {
    pub reference: String,
    pub tour_name: String,
    pub total_price: f64,
    pub traveler_count: u32,
    pub travel_date: Option<NaiveDate>,
    pub full_name: String,
}

// External booking-persistence collaborator. The default implementation only
// logs; nothing is persisted in this scope.
#[async_trait]
pub trait BookingLedger: Send + Sync + 'static {
    async fn record(&self, booking: &BookingRecord);
}

pub struct LogLedger;

#[async_trait]
impl BookingLedger for LogLedger {
    async fn record(&self, booking: &BookingRecord) {
        tracing::info!(
            reference = %booking.reference,
            tour = %booking.tour_name,
            total = booking.total_price,
            travelers = booking.traveler_count,
            "booking confirmed"
        );
    }
}

// Opaque display token: prefix, separator, 8 upper-case base36 characters.
// Best-effort unique; references are not persisted or collision-checked here.
pub fn generate_reference() -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..REFERENCE_LEN)
        .map(|_| REFERENCE_ALPHABET[rng.gen_range(0..REFERENCE_ALPHABET.len())] as char)
        .collect();
    format!("{}-{}", REFERENCE_PREFIX, suffix)
}

#[derive(Debug)]
struct SessionState {
    step: BookingStep,
    travel_date: Option<NaiveDate>,
    traveler_count: u32,
    full_name: String,
    agreed_to_terms: bool,
    is_processing: bool,
    booking_reference: Option<String>,
    // bumped on reset so an in-flight payment completion becomes a no-op
    generation: u64,
}

impl SessionState {
    fn fresh(generation: u64) -> Self {
        Self {
            step: BookingStep::Logistics,
            travel_date: None,
            traveler_count: 1,
            full_name: String::new(),
            agreed_to_terms: false,
            is_processing: false,
            booking_reference: None,
            generation,
        }
    }
}

// One in-progress booking attempt. Owned by the view that opened it; clones
// share the same session so a spawned payment task observes resets.
#[derive(Clone)]
pub struct BookingWizard {
    tour: TourContext,
    config: WizardConfig,
    ledger: Arc<dyn BookingLedger>,
    state: Arc<Mutex<SessionState>>,
}

impl BookingWizard {
    pub fn new(tour: TourContext) -> Self {
        Self::with_config(tour, WizardConfig::default(), Arc::new(LogLedger))
    }

    pub fn with_config(
        tour: TourContext,
        config: WizardConfig,
        ledger: Arc<dyn BookingLedger>,
    ) -> Self {
        Self {
            tour,
            config,
            ledger,
            state: Arc::new(Mutex::new(SessionState::fresh(0))),
        }
    }

    pub fn tour_name(&self) -> &str {
        &self.tour.tour_name
    }

    pub fn step(&self) -> BookingStep {
        self.state.lock().step
    }

    pub fn travel_date(&self) -> Option<NaiveDate> {
        self.state.lock().travel_date
    }

    pub fn set_travel_date(&self, date: NaiveDate) {
        self.state.lock().travel_date = Some(date);
    }

    pub fn clear_travel_date(&self) {
        self.state.lock().travel_date = None;
    }

    pub fn full_name(&self) -> String {
        self.state.lock().full_name.clone()
    }

    pub fn set_full_name(&self, name: &str) {
        self.state.lock().full_name = name.to_string();
    }

    pub fn agreed_to_terms(&self) -> bool {
        self.state.lock().agreed_to_terms
    }

    pub fn set_agreed_to_terms(&self, agreed: bool) {
        self.state.lock().agreed_to_terms = agreed;
    }

    pub fn traveler_count(&self) -> u32 {
        self.state.lock().traveler_count
    }

    pub fn increment_travelers(&self) -> u32 {
        let mut state = self.state.lock();
        state.traveler_count += 1;
        state.traveler_count
    }

    // Clamped at a minimum of one traveler
    pub fn decrement_travelers(&self) -> u32 {
        let mut state = self.state.lock();
        state.traveler_count = state.traveler_count.saturating_sub(1).max(1);
        state.traveler_count
    }

    // Always derived from current state, never stored
    pub fn total_price(&self) -> f64 {
        self.state.lock().traveler_count as f64 * self.tour.price_per_person
    }

    pub fn is_processing(&self) -> bool {
        self.state.lock().is_processing
    }

    pub fn booking_reference(&self) -> Option<String> {
        self.state.lock().booking_reference.clone()
    }

    // Guard for the next-step button. Gating is silent: no validation error is
    // surfaced, progression is simply unavailable until the guard holds.
    pub fn can_advance(&self) -> bool {
        let state = self.state.lock();
        match state.step {
            BookingStep::Logistics => state.travel_date.is_some(),
            BookingStep::LegalAgreement => {
                state.agreed_to_terms && !state.full_name.trim().is_empty()
            }
            // Payment advances only through confirm_payment
            BookingStep::Payment | BookingStep::Confirmed => false,
        }
    }

    // Move one step forward when the guard holds; steps are never skipped
    pub fn advance(&self) -> bool {
        if !self.can_advance() {
            return false;
        }
        let mut state = self.state.lock();
        state.step = match state.step {
            BookingStep::Logistics => BookingStep::LegalAgreement,
            BookingStep::LegalAgreement => BookingStep::Payment,
            other => other,
        };
        true
    }

    // Back is available from steps 2 and 3 only, and never while processing
    pub fn go_back(&self) -> bool {
        let mut state = self.state.lock();
        match state.step {
            BookingStep::LegalAgreement => {
                state.step = BookingStep::Logistics;
                true
            }
            BookingStep::Payment if !state.is_processing => {
                state.step = BookingStep::LegalAgreement;
                true
            }
            _ => false,
        }
    }

    // Simulated payment: fixed delay, never fails. Re-entry while processing
    // is a no-op, and a session reset during the delay invalidates the
    // completion (generation check), so a discarded session is never mutated.
    pub async fn confirm_payment(&self) -> bool {
        let generation = {
            let mut state = self.state.lock();
            if state.step != BookingStep::Payment || state.is_processing {
                return false;
            }
            state.is_processing = true;
            state.generation
        };

        tracing::debug!(tour = %self.tour.tour_name, "payment simulation started");
        tokio::time::sleep(self.config.payment_delay).await;

        let record = {
            let mut state = self.state.lock();
            if state.generation != generation {
                tracing::debug!("session discarded mid-payment, dropping completion");
                return false;
            }
            state.is_processing = false;
            state.step = BookingStep::Confirmed;

            let reference = generate_reference();
            state.booking_reference = Some(reference.clone());

            BookingRecord {
                reference,
                tour_name: self.tour.tour_name.clone(),
                total_price: state.traveler_count as f64 * self.tour.price_per_person,
                traveler_count: state.traveler_count,
                travel_date: state.travel_date,
                full_name: state.full_name.clone(),
            }
        };

        self.ledger.record(&record).await;
        true
    }

    // Discard the session: all mutable fields reset immediately. Any exit
    // animation overlapping the reset is a presentation concern.
    pub fn reset(&self) {
        let mut state = self.state.lock();
        let generation = state.generation + 1;
        *state = SessionState::fresh(generation);
    }
}
