//! In-memory collaborators shared by unit tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::backend::{
    BackendError, CandidateStore, CandidateSubmission, LocationResolver, ModuleDirectory,
    TimesheetSource,
};
use crate::drafts::{DraftStore, MemoryDraftStore};
use crate::models::candidate::CandidateRecord;
use crate::models::location::LocationOption;
use crate::models::module::OrgModule;
use crate::models::timesheet::{LoginLog, Task, TaskStatus};
use crate::wizard::WizardDeps;

fn options(items: &[(i64, &str)]) -> Vec<LocationOption> {
    items
        .iter()
        .map(|(id, name)| LocationOption::new(*id, *name))
        .collect()
}

#[derive(Default)]
pub struct FakeLocations {
    countries: Vec<LocationOption>,
    states: HashMap<i64, Vec<LocationOption>>,
    cities: HashMap<i64, Vec<LocationOption>>,
    pub calls: Mutex<Vec<String>>,
}

impl FakeLocations {
    /// India(1) → Karnataka(5) → Bengaluru(50), Mysuru(51); India → Goa(6)
    /// with no cities; Germany(2) → Bavaria(9) → Munich(90).
    pub fn sample() -> Self {
        Self {
            countries: options(&[(1, "India"), (2, "Germany")]),
            states: HashMap::from([
                (1, options(&[(5, "Karnataka"), (6, "Goa")])),
                (2, options(&[(9, "Bavaria")])),
            ]),
            cities: HashMap::from([
                (5, options(&[(50, "Bengaluru"), (51, "Mysuru")])),
                (6, Vec::new()),
                (9, options(&[(90, "Munich")])),
            ]),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl LocationResolver for FakeLocations {
    async fn countries(&self) -> Result<Vec<LocationOption>, BackendError> {
        self.calls.lock().unwrap().push("countries".into());
        Ok(self.countries.clone())
    }

    async fn states_of(&self, country_id: i64) -> Result<Vec<LocationOption>, BackendError> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("states:{country_id}"));
        Ok(self.states.get(&country_id).cloned().unwrap_or_default())
    }

    async fn cities_of(&self, state_id: i64) -> Result<Vec<LocationOption>, BackendError> {
        self.calls.lock().unwrap().push(format!("cities:{state_id}"));
        Ok(self.cities.get(&state_id).cloned().unwrap_or_default())
    }
}

/// Upserts by organization id, like the real `candidate/store` endpoint.
#[derive(Default)]
pub struct FakeCandidates {
    records: Mutex<HashMap<i64, CandidateRecord>>,
    pub submissions: Mutex<Vec<CandidateSubmission>>,
    failure: Mutex<Option<(u16, String)>>,
    acknowledge_only: Mutex<bool>,
}

impl FakeCandidates {
    pub fn with_record(record: CandidateRecord) -> Self {
        let store = Self::default();
        if let Some(org) = record.org_id {
            store.records.lock().unwrap().insert(org, record);
        }
        store
    }

    pub fn fail_with(&self, status: u16, message: &str) {
        *self.failure.lock().unwrap() = Some((status, message.to_string()));
    }

    /// Accepts submissions without returning or keeping a record.
    pub fn acknowledge_only(&self) {
        *self.acknowledge_only.lock().unwrap() = true;
    }

    pub fn record_count(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    pub fn submission_count(&self) -> usize {
        self.submissions.lock().unwrap().len()
    }
}

#[async_trait]
impl CandidateStore for FakeCandidates {
    async fn get_by_organization(
        &self,
        org_id: i64,
    ) -> Result<Option<CandidateRecord>, BackendError> {
        Ok(self.records.lock().unwrap().get(&org_id).cloned())
    }

    async fn create_or_update(
        &self,
        submission: CandidateSubmission,
    ) -> Result<Option<CandidateRecord>, BackendError> {
        self.submissions.lock().unwrap().push(submission.clone());
        if let Some((status, message)) = self.failure.lock().unwrap().clone() {
            return Err(BackendError::Api { status, message });
        }
        if *self.acknowledge_only.lock().unwrap() {
            return Ok(None);
        }

        let mut records = self.records.lock().unwrap();
        let next_id = records.len() as i64 + 1;
        let id = records
            .get(&submission.org_id)
            .map(|r| r.id)
            .unwrap_or(next_id);
        let img_url = match &submission.image {
            Some(image) => Some(format!("http://cdn.test/uploads/{}", image.file_name)),
            None => submission.image_ref.clone(),
        };
        let record = CandidateRecord {
            id,
            org_id: Some(submission.org_id),
            name: submission.name,
            email: submission.email,
            phone: submission.phone,
            address: submission.address,
            country: submission.country,
            state: submission.state,
            city: submission.city,
            pincode: submission.pincode,
            img_url,
        };
        records.insert(record.org_id.unwrap_or_default(), record.clone());
        Ok(Some(record))
    }
}

/// Keeps tasks in memory and records calendar-log calls.
#[derive(Default)]
pub struct FakeTimesheet {
    pub tasks: Mutex<Vec<Task>>,
    pub latest: Option<LoginLog>,
    pub logins: Mutex<Vec<i64>>,
    pub logouts: Mutex<Vec<i64>>,
    calendar_log_down: Mutex<bool>,
}

impl FakeTimesheet {
    pub fn with_tasks(tasks: Vec<Task>) -> Self {
        Self {
            tasks: Mutex::new(tasks),
            ..Default::default()
        }
    }

    /// Makes every calendar-log call fail with a 503.
    pub fn calendar_log_down(&self) {
        *self.calendar_log_down.lock().unwrap() = true;
    }

    fn calendar_log_check(&self) -> Result<(), BackendError> {
        if *self.calendar_log_down.lock().unwrap() {
            return Err(BackendError::Api {
                status: 503,
                message: "calendar log unavailable".into(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl TimesheetSource for FakeTimesheet {
    async fn tasks(&self) -> Result<Vec<Task>, BackendError> {
        Ok(self.tasks.lock().unwrap().clone())
    }

    async fn add_task(&self, task: &Task) -> Result<Option<i64>, BackendError> {
        let mut tasks = self.tasks.lock().unwrap();
        let id = tasks.iter().filter_map(|t| t.id).max().unwrap_or(0) + 1;
        tasks.push(Task {
            id: Some(id),
            ..task.clone()
        });
        Ok(Some(id))
    }

    async fn update_status(&self, task_id: i64, status: TaskStatus) -> Result<(), BackendError> {
        let mut tasks = self.tasks.lock().unwrap();
        let task = tasks
            .iter_mut()
            .find(|t| t.id == Some(task_id))
            .ok_or_else(|| BackendError::Api {
                status: 404,
                message: "Task not found".into(),
            })?;
        task.status = status;
        Ok(())
    }

    async fn latest_login(&self, _org_id: i64) -> Result<Option<LoginLog>, BackendError> {
        Ok(self.latest.clone())
    }

    async fn log_login(&self, org_id: i64) -> Result<Option<i64>, BackendError> {
        self.calendar_log_check()?;
        let mut logins = self.logins.lock().unwrap();
        logins.push(org_id);
        Ok(Some(100 + logins.len() as i64))
    }

    async fn log_logout(&self, calendar_id: i64) -> Result<(), BackendError> {
        self.calendar_log_check()?;
        self.logouts.lock().unwrap().push(calendar_id);
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeModules {
    pub modules: HashMap<i64, Vec<OrgModule>>,
}

impl FakeModules {
    /// Org 3 has Timesheet then Candidate; every other org has none.
    pub fn sample() -> Self {
        let module = |id, name: &str| OrgModule {
            id: Some(id),
            module_name: name.to_string(),
        };
        Self {
            modules: HashMap::from([(3, vec![module(1, "Timesheet"), module(2, "Candidate")])]),
        }
    }
}

#[async_trait]
impl ModuleDirectory for FakeModules {
    async fn modules(&self, org_id: i64) -> Result<Vec<OrgModule>, BackendError> {
        Ok(self.modules.get(&org_id).cloned().unwrap_or_default())
    }
}

/// Fakes wired together, with handles kept for assertions.
pub struct Harness {
    pub locations: Arc<FakeLocations>,
    pub candidates: Arc<FakeCandidates>,
    pub drafts: Arc<MemoryDraftStore>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_candidates(FakeCandidates::default())
    }

    pub fn with_candidates(candidates: FakeCandidates) -> Self {
        Self {
            locations: Arc::new(FakeLocations::sample()),
            candidates: Arc::new(candidates),
            drafts: Arc::new(MemoryDraftStore::default()),
        }
    }

    pub fn deps(&self) -> WizardDeps {
        WizardDeps {
            locations: self.locations.clone(),
            candidates: self.candidates.clone(),
            drafts: self.drafts.clone(),
        }
    }

    pub async fn draft(&self) -> Option<serde_json::Value> {
        self.drafts
            .get(crate::wizard::machine::DRAFT_KEY)
            .await
            .unwrap()
    }
}
