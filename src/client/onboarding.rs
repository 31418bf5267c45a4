//! Six-step onboarding wizard.
//!
//! The wizard is a finite-state machine: one state per [`Step`] plus the
//! terminal [`WizardState::Submitted`]. Advancing is guarded by the step's
//! required fields; going back is not. The draft and current step are written
//! to local storage on every change and on a fixed timer, and offered for
//! resumption the next time the wizard is opened.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::{sync::Mutex, task::JoinHandle};
use tracing::{debug, info, warn};

use super::storage::{SharedStorage, PROFILE_KEY, PROGRESS_KEY};
use crate::profile::{Profile, MAX_AGE};

pub const MIN_AGE: u32 = 13;
pub const AUTOSAVE_INTERVAL: Duration = Duration::from_secs(30);
pub const TOTAL_STEPS: u8 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    BasicInfo,
    Situation,
    PastStruggles,
    CurrentChallenges,
    FutureGoals,
    PersonalityAndDreams,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    Name,
    Age,
    CurrentSituation,
    PastStruggles,
    CurrentChallenges,
    FutureGoals,
    DesiredPersonality,
    Dreams,
}

impl Step {
    pub const FIRST: Step = Step::BasicInfo;

    /// 1-based position, as stored in saved progress.
    pub fn number(self) -> u8 {
        match self {
            Step::BasicInfo => 1,
            Step::Situation => 2,
            Step::PastStruggles => 3,
            Step::CurrentChallenges => 4,
            Step::FutureGoals => 5,
            Step::PersonalityAndDreams => 6,
        }
    }

    pub fn from_number(n: u8) -> Option<Step> {
        match n {
            1 => Some(Step::BasicInfo),
            2 => Some(Step::Situation),
            3 => Some(Step::PastStruggles),
            4 => Some(Step::CurrentChallenges),
            5 => Some(Step::FutureGoals),
            6 => Some(Step::PersonalityAndDreams),
            _ => None,
        }
    }

    /// `None` from the last step: the next transition is submission.
    pub fn next(self) -> Option<Step> {
        Step::from_number(self.number() + 1)
    }

    pub fn prev(self) -> Option<Step> {
        Step::from_number(self.number().saturating_sub(1))
    }

    pub fn required_fields(self) -> &'static [Field] {
        match self {
            Step::BasicInfo => &[Field::Name, Field::Age],
            Step::Situation => &[Field::CurrentSituation],
            Step::PastStruggles => &[Field::PastStruggles],
            Step::CurrentChallenges => &[Field::CurrentChallenges],
            Step::FutureGoals => &[Field::FutureGoals],
            Step::PersonalityAndDreams => &[Field::DesiredPersonality, Field::Dreams],
        }
    }

    pub fn is_last(self) -> bool {
        self.next().is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardState {
    InProgress(Step),
    Submitted,
}

#[derive(Debug, thiserror::Error)]
pub enum WizardError {
    #[error("step {} is incomplete: {fields:?}", .step.number())]
    Incomplete { step: Step, fields: Vec<Field> },
    #[error("submission is only possible from the last step")]
    NotAtFinalStep,
    #[error("onboarding already submitted")]
    AlreadySubmitted,
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

/// Raw form values, exactly as typed. Age stays a string until submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProfileDraft {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub age: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub current_situation: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub past_struggles: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub current_challenges: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub future_goals: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub desired_personality: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub dreams: String,
}

impl ProfileDraft {
    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::Name => &self.name,
            Field::Age => &self.age,
            Field::CurrentSituation => &self.current_situation,
            Field::PastStruggles => &self.past_struggles,
            Field::CurrentChallenges => &self.current_challenges,
            Field::FutureGoals => &self.future_goals,
            Field::DesiredPersonality => &self.desired_personality,
            Field::Dreams => &self.dreams,
        }
    }

    fn slot(&mut self, field: Field) -> &mut String {
        match field {
            Field::Name => &mut self.name,
            Field::Age => &mut self.age,
            Field::CurrentSituation => &mut self.current_situation,
            Field::PastStruggles => &mut self.past_struggles,
            Field::CurrentChallenges => &mut self.current_challenges,
            Field::FutureGoals => &mut self.future_goals,
            Field::DesiredPersonality => &mut self.desired_personality,
            Field::Dreams => &mut self.dreams,
        }
    }

    fn parsed_age(&self) -> Option<u32> {
        self.age.trim().parse::<u32>().ok()
    }

    fn is_valid(&self, field: Field) -> bool {
        match field {
            Field::Age => self.parsed_age().is_some_and(|a| (MIN_AGE..=MAX_AGE).contains(&a)),
            other => !self.get(other).trim().is_empty(),
        }
    }

    fn to_profile(&self) -> Profile {
        Profile {
            name: self.name.trim().to_string(),
            age: self.parsed_age(),
            current_situation: self.current_situation.trim().to_string(),
            past_struggles: self.past_struggles.trim().to_string(),
            current_challenges: self.current_challenges.trim().to_string(),
            future_goals: self.future_goals.trim().to_string(),
            desired_personality: self.desired_personality.trim().to_string(),
            dreams: self.dreams.trim().to_string(),
        }
    }
}

/// Layout of the progress entry in local storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SavedProgress {
    current_step: u8,
    #[serde(default)]
    user_profile: ProfileDraft,
}

pub struct Wizard {
    storage: SharedStorage,
    state: WizardState,
    draft: ProfileDraft,
    flagged: Vec<Field>,
    pending_resume: Option<Step>,
}

impl Wizard {
    /// Opens the wizard, restoring any saved draft. When the saved step is past
    /// the first, a resume offer is left pending for [`Wizard::resume`] or
    /// [`Wizard::start_fresh`].
    pub fn open(storage: SharedStorage) -> Self {
        let saved = match storage.get(PROGRESS_KEY) {
            Ok(Some(raw)) => serde_json::from_str::<SavedProgress>(&raw)
                .map_err(|e| warn!(error = %e, "ignoring unreadable onboarding progress"))
                .ok(),
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "could not read onboarding progress");
                None
            }
        };

        let mut wizard = Self {
            storage,
            state: WizardState::InProgress(Step::FIRST),
            draft: ProfileDraft::default(),
            flagged: Vec::new(),
            pending_resume: None,
        };

        if let Some(saved) = saved {
            wizard.draft = saved.user_profile;
            wizard.pending_resume = Step::from_number(saved.current_step).filter(|s| *s != Step::FIRST);
            debug!(step = saved.current_step, "restored onboarding draft");
        }
        wizard
    }

    pub fn state(&self) -> WizardState {
        self.state
    }

    pub fn current_step(&self) -> Option<Step> {
        match self.state {
            WizardState::InProgress(step) => Some(step),
            WizardState::Submitted => None,
        }
    }

    pub fn draft(&self) -> &ProfileDraft {
        &self.draft
    }

    /// Fields that failed the last guard check.
    pub fn flagged(&self) -> &[Field] {
        &self.flagged
    }

    pub fn pending_resume(&self) -> Option<Step> {
        self.pending_resume
    }

    pub fn resume(&mut self) {
        if let Some(step) = self.pending_resume.take() {
            if self.state != WizardState::Submitted {
                self.state = WizardState::InProgress(step);
            }
        }
    }

    pub fn start_fresh(&mut self) -> Result<(), WizardError> {
        self.storage.remove(PROGRESS_KEY)?;
        self.draft = ProfileDraft::default();
        self.flagged.clear();
        self.pending_resume = None;
        self.state = WizardState::InProgress(Step::FIRST);
        Ok(())
    }

    pub fn set_field(&mut self, field: Field, value: impl Into<String>) {
        *self.draft.slot(field) = value.into();
        self.flagged.retain(|f| *f != field);
        self.save_progress();
    }

    /// Fields of `step` that currently fail validation.
    pub fn missing_fields(&self, step: Step) -> Vec<Field> {
        step.required_fields()
            .iter()
            .copied()
            .filter(|f| !self.draft.is_valid(*f))
            .collect()
    }

    fn guard(&mut self, step: Step) -> Result<(), WizardError> {
        let missing = self.missing_fields(step);
        if missing.is_empty() {
            self.flagged.clear();
            Ok(())
        } else {
            debug!(step = step.number(), ?missing, "step guard failed");
            self.flagged = missing.clone();
            Err(WizardError::Incomplete {
                step,
                fields: missing,
            })
        }
    }

    /// Advances one step, or submits from the last step.
    pub fn next_step(&mut self) -> Result<WizardState, WizardError> {
        let WizardState::InProgress(step) = self.state else {
            return Err(WizardError::AlreadySubmitted);
        };
        match step.next() {
            Some(next) => {
                self.guard(step)?;
                self.state = WizardState::InProgress(next);
                self.save_progress();
                Ok(self.state)
            }
            None => {
                self.submit()?;
                Ok(self.state)
            }
        }
    }

    /// Moves back one step without validation; stays put on the first step.
    pub fn prev_step(&mut self) -> WizardState {
        if let WizardState::InProgress(step) = self.state {
            if let Some(prev) = step.prev() {
                self.state = WizardState::InProgress(prev);
            }
            self.save_progress();
        }
        self.state
    }

    /// Validates the last step and stores the completed profile.
    pub fn submit(&mut self) -> Result<Profile, WizardError> {
        let step = match self.state {
            WizardState::Submitted => return Err(WizardError::AlreadySubmitted),
            WizardState::InProgress(step) if !step.is_last() => {
                return Err(WizardError::NotAtFinalStep)
            }
            WizardState::InProgress(step) => step,
        };
        self.guard(step)?;

        let profile = self.draft.to_profile();
        self.store_profile(&profile)?;
        self.state = WizardState::Submitted;
        info!(name = %profile.name, "onboarding completed");
        Ok(profile)
    }

    /// Demo shortcut: fabricates a default profile and jumps straight to the
    /// chat, skipping every validation guard. Not a security boundary.
    pub fn skip_onboarding(&mut self) -> Result<Profile, WizardError> {
        let name = match self.draft.name.trim() {
            "" => "User".to_string(),
            n => n.to_string(),
        };
        let profile = Profile {
            name,
            age: Some(self.draft.parsed_age().unwrap_or(30)),
            current_situation: "Working professional".into(),
            past_struggles: "Various challenges".into(),
            current_challenges: "Work-life balance".into(),
            future_goals: "Career advancement and personal growth".into(),
            desired_personality: "Confident and balanced".into(),
            dreams: "Success and happiness".into(),
        };
        self.store_profile(&profile)?;
        self.state = WizardState::Submitted;
        self.flagged.clear();
        info!(name = %profile.name, "onboarding skipped");
        Ok(profile)
    }

    fn store_profile(&self, profile: &Profile) -> Result<(), WizardError> {
        let raw = serde_json::to_string(profile).map_err(anyhow::Error::from)?;
        self.storage.set(PROFILE_KEY, &raw)?;
        Ok(())
    }

    /// Writes step + draft to storage. Failures are logged only.
    pub fn save_progress(&self) {
        let WizardState::InProgress(step) = self.state else {
            return;
        };
        let progress = SavedProgress {
            current_step: step.number(),
            user_profile: self.draft.clone(),
        };
        let result = serde_json::to_string(&progress)
            .map_err(anyhow::Error::from)
            .and_then(|raw| self.storage.set(PROGRESS_KEY, &raw));
        if let Err(e) = result {
            warn!(error = %e, "auto-save failed");
        }
    }
}

/// Saves the wizard's progress every `every` until the task is aborted.
pub fn spawn_autosave(wizard: Arc<Mutex<Wizard>>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            wizard.lock().await.save_progress();
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::storage::{LocalStorage, MemoryStorage};

    const ALL_STEPS: [Step; 6] = [
        Step::BasicInfo,
        Step::Situation,
        Step::PastStruggles,
        Step::CurrentChallenges,
        Step::FutureGoals,
        Step::PersonalityAndDreams,
    ];

    fn fill(wizard: &mut Wizard, step: Step) {
        for field in step.required_fields() {
            let value = if *field == Field::Age { "23" } else { "something real" };
            wizard.set_field(*field, value);
        }
    }

    fn saved(storage: &SharedStorage) -> SavedProgress {
        serde_json::from_str(&storage.get(PROGRESS_KEY).unwrap().unwrap()).unwrap()
    }

    #[test]
    fn transition_table_is_linear() {
        for (i, step) in ALL_STEPS.iter().enumerate() {
            assert_eq!(step.number() as usize, i + 1);
            assert_eq!(step.next(), ALL_STEPS.get(i + 1).copied());
            assert_eq!(step.prev(), i.checked_sub(1).map(|p| ALL_STEPS[p]));
        }
        assert_eq!(Step::from_number(0), None);
        assert_eq!(Step::from_number(TOTAL_STEPS + 1), None);
    }

    #[test]
    fn empty_required_field_blocks_every_step() {
        for target in ALL_STEPS {
            let mut wizard = Wizard::open(MemoryStorage::shared());
            for step in ALL_STEPS.iter().take_while(|s| **s != target) {
                fill(&mut wizard, *step);
                wizard.next_step().unwrap();
            }
            for missing in target.required_fields() {
                fill(&mut wizard, target);
                wizard.set_field(*missing, "   ");
                let err = wizard.next_step().unwrap_err();
                match err {
                    WizardError::Incomplete { step, fields } => {
                        assert_eq!(step, target);
                        assert_eq!(fields, vec![*missing]);
                    }
                    e => panic!("unexpected {e:?}"),
                }
                assert_eq!(wizard.state(), WizardState::InProgress(target));
                assert_eq!(wizard.flagged(), &[*missing]);
            }
        }
    }

    #[test]
    fn filled_steps_always_advance_to_submission() {
        let storage = MemoryStorage::shared();
        let mut wizard = Wizard::open(storage.clone());
        for (i, step) in ALL_STEPS.iter().enumerate() {
            fill(&mut wizard, *step);
            let state = wizard.next_step().unwrap();
            match ALL_STEPS.get(i + 1) {
                Some(next) => assert_eq!(state, WizardState::InProgress(*next)),
                None => assert_eq!(state, WizardState::Submitted),
            }
        }
        let stored: Profile =
            serde_json::from_str(&storage.get(PROFILE_KEY).unwrap().unwrap()).unwrap();
        assert_eq!(stored.age, Some(23));
        assert_eq!(stored.dreams, "something real");
        assert!(matches!(
            wizard.next_step(),
            Err(WizardError::AlreadySubmitted)
        ));
    }

    #[test]
    fn age_must_be_in_range() {
        let mut wizard = Wizard::open(MemoryStorage::shared());
        wizard.set_field(Field::Name, "Sam");
        for bad in ["12", "", "abc", "-5", "151", "4294967295"] {
            wizard.set_field(Field::Age, bad);
            assert!(wizard.next_step().is_err(), "age {bad:?} accepted");
            assert_eq!(wizard.flagged(), &[Field::Age]);
        }
        wizard.set_field(Field::Age, "13");
        assert_eq!(
            wizard.next_step().unwrap(),
            WizardState::InProgress(Step::Situation)
        );
        assert!(wizard.flagged().is_empty());
    }

    #[test]
    fn prev_step_skips_validation_and_stops_at_first() {
        let mut wizard = Wizard::open(MemoryStorage::shared());
        assert_eq!(wizard.prev_step(), WizardState::InProgress(Step::BasicInfo));
        fill(&mut wizard, Step::BasicInfo);
        wizard.next_step().unwrap();
        assert_eq!(wizard.prev_step(), WizardState::InProgress(Step::BasicInfo));
    }

    #[test]
    fn submit_requires_the_last_step() {
        let mut wizard = Wizard::open(MemoryStorage::shared());
        assert!(matches!(wizard.submit(), Err(WizardError::NotAtFinalStep)));
    }

    #[test]
    fn every_field_change_autosaves() {
        let storage = MemoryStorage::shared();
        let mut wizard = Wizard::open(storage.clone());
        wizard.set_field(Field::Name, "Sam");
        let progress = saved(&storage);
        assert_eq!(progress.current_step, 1);
        assert_eq!(progress.user_profile.name, "Sam");

        wizard.set_field(Field::Age, "23");
        wizard.next_step().unwrap();
        assert_eq!(saved(&storage).current_step, 2);
    }

    #[test]
    fn reopening_offers_resume_at_saved_step() {
        let storage = MemoryStorage::shared();
        let mut wizard = Wizard::open(storage.clone());
        for step in &ALL_STEPS[..3] {
            fill(&mut wizard, *step);
            wizard.next_step().unwrap();
        }

        let mut reopened = Wizard::open(storage);
        assert_eq!(reopened.pending_resume(), Some(Step::CurrentChallenges));
        assert_eq!(reopened.state(), WizardState::InProgress(Step::BasicInfo));
        assert_eq!(reopened.draft().name, "something real");
        reopened.resume();
        assert_eq!(
            reopened.state(),
            WizardState::InProgress(Step::CurrentChallenges)
        );
        assert_eq!(reopened.pending_resume(), None);
    }

    #[test]
    fn saved_first_step_restores_draft_without_prompt() {
        let storage = MemoryStorage::shared();
        let mut wizard = Wizard::open(storage.clone());
        wizard.set_field(Field::Name, "Sam");

        let reopened = Wizard::open(storage);
        assert_eq!(reopened.pending_resume(), None);
        assert_eq!(reopened.draft().name, "Sam");
    }

    #[test]
    fn start_fresh_discards_saved_progress() {
        let storage = MemoryStorage::shared();
        let mut wizard = Wizard::open(storage.clone());
        fill(&mut wizard, Step::BasicInfo);
        wizard.next_step().unwrap();

        let mut reopened = Wizard::open(storage.clone());
        reopened.start_fresh().unwrap();
        assert!(storage.get(PROGRESS_KEY).unwrap().is_none());
        assert_eq!(reopened.draft(), &ProfileDraft::default());
        assert_eq!(reopened.state(), WizardState::InProgress(Step::BasicInfo));
        assert_eq!(reopened.pending_resume(), None);
    }

    #[test]
    fn skip_bypasses_validation_with_defaults() {
        let storage = MemoryStorage::shared();
        let mut wizard = Wizard::open(storage.clone());
        let profile = wizard.skip_onboarding().unwrap();
        assert_eq!(profile.name, "User");
        assert_eq!(profile.age, Some(30));
        assert_eq!(profile.current_challenges, "Work-life balance");
        assert_eq!(wizard.state(), WizardState::Submitted);
        assert!(storage.get(PROFILE_KEY).unwrap().is_some());
    }

    #[test]
    fn skip_keeps_typed_name_and_age() {
        let mut wizard = Wizard::open(MemoryStorage::shared());
        wizard.set_field(Field::Name, " Sam ");
        wizard.set_field(Field::Age, "10");
        let profile = wizard.skip_onboarding().unwrap();
        assert_eq!(profile.name, "Sam");
        assert_eq!(profile.age, Some(10));
    }

    #[tokio::test]
    async fn timer_autosave_writes_progress() {
        let storage = MemoryStorage::shared();
        let mut wizard = Wizard::open(storage.clone());
        fill(&mut wizard, Step::BasicInfo);
        wizard.next_step().unwrap();
        storage.remove(PROGRESS_KEY).unwrap();

        let wizard = Arc::new(Mutex::new(wizard));
        let handle = spawn_autosave(wizard.clone(), Duration::from_millis(20));
        tokio::time::sleep(Duration::from_millis(100)).await;
        handle.abort();

        assert_eq!(saved(&storage).current_step, 2);
    }
}
