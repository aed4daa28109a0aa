use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::cascade::{fetch, LocationCascade, LocationRequest, LocationResponse};
use super::forms::{
    progress, AddressInfo, AddressPatch, BasicInfo, BasicInfoPatch, FieldError, ImageField,
    ValidationReport,
};
use super::preview::Preview;
use super::{Step, WizardError};
use crate::backend::{CandidateStore, CandidateSubmission, LocationResolver, StagedImage};
use crate::drafts::DraftStore;
use crate::models::auth::{AuthSession, AUTH_KEY};
use crate::models::candidate::CandidateRecord;
use crate::models::location::LocationOption;

/// Draft-store key of the in-progress candidate.
pub const DRAFT_KEY: &str = "candidate-progress";

const SUBMIT_FALLBACK: &str = "Failed to save candidate";
const CREATED: &str = "Candidate created successfully";
const UPDATED: &str = "Candidate updated successfully";

/// Collaborators a wizard talks to.
#[derive(Clone)]
pub struct WizardDeps {
    pub locations: Arc<dyn LocationResolver>,
    pub candidates: Arc<dyn CandidateStore>,
    pub drafts: Arc<dyn DraftStore>,
}

/// The draft record. Only ever written for a candidate that does not exist
/// on the backend yet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistedProgress {
    pub basic_info: BasicInfo,
    pub address_info: AddressInfo,
    pub step: Step,
    pub preview: Preview,
}

/// Everything a view layer needs to render the wizard.
#[derive(Debug, Clone, Serialize)]
pub struct WizardView {
    pub step: Step,
    pub step_class: &'static str,
    pub basic_info: BasicInfo,
    pub address_info: AddressInfo,
    pub preview: Preview,
    pub progress: u8,
    pub countries: Vec<LocationOption>,
    pub states: Vec<LocationOption>,
    pub cities: Vec<LocationOption>,
    /// Errors of the groups the user already tried to leave.
    pub errors: Vec<FieldError>,
    pub submitted: bool,
    pub message: Option<String>,
    pub org_id: Option<i64>,
    pub existing_candidate_id: Option<i64>,
    pub autosave: bool,
    pub has_staged_image: bool,
}

pub struct WizardMachine {
    deps: WizardDeps,
    step: Step,
    basic: BasicInfo,
    address: AddressInfo,
    preview: Preview,
    cascade: LocationCascade,
    org_id: Option<i64>,
    existing: Option<CandidateRecord>,
    staged_image: Option<StagedImage>,
    basic_touched: bool,
    address_touched: bool,
    submitted: bool,
    message: Option<String>,
}

impl WizardMachine {
    fn new(deps: WizardDeps, org_id: Option<i64>) -> Self {
        Self {
            deps,
            step: Step::BasicInfo,
            basic: BasicInfo::default(),
            address: AddressInfo::default(),
            preview: Preview::default(),
            cascade: LocationCascade::default(),
            org_id,
            existing: None,
            staged_image: None,
            basic_touched: false,
            address_touched: false,
            submitted: false,
            message: None,
        }
    }

    /// Builds the wizard for an organization.
    ///
    /// An existing candidate wins over any draft and opens on the preview
    /// with autosave off. Otherwise a draft is restored verbatim, and the
    /// returned requests re-load the option lists for its selection.
    /// Without `org_id` the profile's stored auth session is consulted.
    pub async fn mount(deps: WizardDeps, org_id: Option<i64>) -> (Self, Vec<LocationRequest>) {
        let mut machine = Self::new(deps, org_id);

        match machine.deps.locations.countries().await {
            Ok(countries) => machine.cascade.set_countries(countries),
            Err(e) => warn!("Failed to load countries: {e}"),
        }

        if machine.org_id.is_none() {
            machine.org_id = machine.stored_org_id().await;
        }

        if let Some(org_id) = machine.org_id {
            match machine.deps.candidates.get_by_organization(org_id).await {
                Ok(Some(record)) => {
                    machine.load_existing(record).await;
                    return (machine, Vec::new());
                }
                Ok(None) => {}
                Err(e) => warn!("Candidate lookup for org {org_id} failed: {e}"),
            }
        }

        let requests = machine.resume().await;
        (machine, requests)
    }

    async fn stored_org_id(&self) -> Option<i64> {
        let raw = match self.deps.drafts.get(AUTH_KEY).await {
            Ok(raw) => raw?,
            Err(e) => {
                warn!("Failed to read stored auth session: {e}");
                return None;
            }
        };
        match serde_json::from_value::<AuthSession>(raw) {
            Ok(auth) => Some(auth.id),
            Err(e) => {
                warn!("Ignoring unreadable auth session: {e}");
                None
            }
        }
    }

    async fn load_existing(&mut self, record: CandidateRecord) {
        self.basic = BasicInfo {
            name: record.name.clone(),
            email: record.email.clone(),
            phone: record.phone.clone(),
        };
        let image = record.img_url.clone().filter(|url| !url.is_empty());
        self.address = AddressInfo {
            address: record.address.clone(),
            country_id: record.country,
            state_id: record.state,
            city_id: record.city,
            pincode: record.pincode.clone(),
            image: image.clone().map(ImageField::Stored),
        };

        // The full cascade is resolved before the preview is built.
        if let Some(request) = self.cascade.select_country(record.country) {
            let response = fetch(self.deps.locations.as_ref(), request).await;
            self.cascade.apply(response);
            if let Some(request) = self.cascade.select_state(record.state) {
                let response = fetch(self.deps.locations.as_ref(), request).await;
                self.cascade.apply(response);
            }
        }

        self.preview = Preview {
            image,
            ..Preview::default()
        };
        self.refresh_preview();
        self.step = Step::Preview;

        info!(
            "Loaded existing candidate {} for org {:?}; autosave disabled",
            record.id, self.org_id
        );
        self.existing = Some(record);
    }

    async fn resume(&mut self) -> Vec<LocationRequest> {
        let raw = match self.deps.drafts.get(DRAFT_KEY).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!("Failed to read wizard draft: {e}");
                return Vec::new();
            }
        };
        let progress: PersistedProgress = match serde_json::from_value(raw) {
            Ok(progress) => progress,
            Err(e) => {
                warn!("Ignoring unreadable wizard draft: {e}");
                return Vec::new();
            }
        };

        self.basic = progress.basic_info;
        self.address = progress.address_info;
        self.step = progress.step;
        self.preview = progress.preview;
        info!("Resumed wizard draft at step {}", self.step.number());

        let mut requests = Vec::new();
        requests.extend(self.cascade.select_country(self.address.country_id));
        if self.address.country_id.is_some() {
            requests.extend(self.cascade.select_state(self.address.state_id));
        }
        requests
    }

    /// Autosave runs only while no backend record exists for the organization.
    pub fn autosave(&self) -> bool {
        self.existing.is_none()
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn basic_info(&self) -> &BasicInfo {
        &self.basic
    }

    pub fn address_info(&self) -> &AddressInfo {
        &self.address
    }

    pub fn preview(&self) -> &Preview {
        &self.preview
    }

    pub fn cascade(&self) -> &LocationCascade {
        &self.cascade
    }

    pub fn org_id(&self) -> Option<i64> {
        self.org_id
    }

    pub fn existing_candidate_id(&self) -> Option<i64> {
        self.existing.as_ref().map(|r| r.id)
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn submitted(&self) -> bool {
        self.submitted
    }

    pub fn progress(&self) -> u8 {
        progress(&self.basic, &self.address)
    }

    fn refresh_preview(&mut self) {
        self.preview = Preview::build(&self.basic, &self.address, &self.cascade, &self.preview);
    }

    async fn persist(&self) {
        if !self.autosave() {
            return;
        }
        let progress = PersistedProgress {
            basic_info: self.basic.clone(),
            address_info: self.address.clone(),
            step: self.step,
            preview: self.preview.clone(),
        };
        let saved = match serde_json::to_value(&progress) {
            Ok(value) => self.deps.drafts.set(DRAFT_KEY, &value).await,
            Err(e) => Err(e.into()),
        };
        if let Err(e) = saved {
            warn!("Failed to save wizard draft: {e}");
        }
    }

    /// Lands a location fetch. Stale responses are dropped.
    pub fn on_locations(&mut self, response: LocationResponse) -> bool {
        let accepted = self.cascade.apply(response);
        if accepted {
            self.refresh_preview();
        }
        accepted
    }

    pub async fn edit_basic(&mut self, patch: BasicInfoPatch) {
        self.basic.apply(patch);
        self.refresh_preview();
        self.persist().await;
    }

    pub async fn edit_address(&mut self, patch: AddressPatch) {
        self.address.apply(patch);
        self.refresh_preview();
        self.persist().await;
    }

    /// Selects a country, clearing state and city, and returns the states
    /// fetch to run.
    pub async fn select_country(&mut self, country_id: Option<i64>) -> Option<LocationRequest> {
        self.address.country_id = country_id;
        self.address.state_id = None;
        self.address.city_id = None;
        let request = self.cascade.select_country(country_id);
        self.refresh_preview();
        self.persist().await;
        request
    }

    /// Selects a state, clearing the city, and returns the cities fetch to run.
    pub async fn select_state(&mut self, state_id: Option<i64>) -> Option<LocationRequest> {
        self.address.state_id = state_id;
        self.address.city_id = None;
        let request = self.cascade.select_state(state_id);
        self.refresh_preview();
        self.persist().await;
        request
    }

    /// Forward transition out of the current step, guarded by that step's
    /// validation. On failure the step's fields are marked touched and
    /// nothing is persisted.
    pub async fn next(&mut self) -> Result<Step, WizardError> {
        match self.step {
            Step::BasicInfo => {
                let errors = self.basic.validate();
                if !errors.is_empty() {
                    self.basic_touched = true;
                    return Err(WizardError::Validation(ValidationReport { fields: errors }));
                }
                self.step = Step::AddressInfo;
            }
            Step::AddressInfo => {
                let errors = self.address.validate(self.cascade.cities_available());
                if !errors.is_empty() {
                    self.address_touched = true;
                    return Err(WizardError::Validation(ValidationReport { fields: errors }));
                }
                self.refresh_preview();
                self.step = Step::Preview;
            }
            Step::Preview => return Ok(self.step),
        }
        self.persist().await;
        Ok(self.step)
    }

    pub async fn back(&mut self) -> Step {
        self.step = match self.step {
            Step::Preview => Step::AddressInfo,
            Step::AddressInfo | Step::BasicInfo => Step::BasicInfo,
        };
        self.persist().await;
        self.step
    }

    /// Unguarded jump used by progress indicators.
    pub async fn set_step(&mut self, step: Step) {
        self.step = step;
        self.persist().await;
    }

    /// Shows the file in the preview right away and keeps it for submission.
    pub async fn stage_image(&mut self, image: StagedImage) {
        self.preview.image = Some(image.data_url());
        self.address.image = Some(ImageField::Staged(image.file_name.clone()));
        self.staged_image = Some(image);
        self.refresh_preview();
        self.persist().await;
    }

    fn submission(&self, org_id: i64) -> CandidateSubmission {
        CandidateSubmission {
            org_id,
            name: self.basic.name.clone(),
            email: self.basic.email.clone(),
            phone: self.basic.phone.clone(),
            address: self.address.address.clone(),
            country: self.address.country_id,
            state: self.address.state_id,
            city: self.address.city_id,
            pincode: self.address.pincode.clone(),
            image_ref: match &self.address.image {
                Some(ImageField::Stored(url)) => Some(url.clone()),
                _ => None,
            },
            image: self.staged_image.clone(),
        }
    }

    /// Creates or updates the organization's candidate.
    ///
    /// Success swaps the staged preview image for the stored reference and
    /// clears the draft. Failure keeps the draft so the user can retry.
    pub async fn submit(&mut self) -> Result<Option<CandidateRecord>, WizardError> {
        let Some(org_id) = self.org_id else {
            self.message = Some(WizardError::MissingOrganization.to_string());
            return Err(WizardError::MissingOrganization);
        };

        let updating = self.existing.is_some();
        let result = self
            .deps
            .candidates
            .create_or_update(self.submission(org_id))
            .await;
        self.submitted = true;

        match result {
            Ok(record) => {
                self.message = Some(if updating { UPDATED } else { CREATED }.to_string());
                self.staged_image = None;
                if let Err(e) = self.deps.drafts.remove(DRAFT_KEY).await {
                    warn!("Failed to clear wizard draft: {e}");
                }
                match &record {
                    Some(record) => {
                        info!("Candidate {} saved for org {}", record.id, org_id);
                        self.preview.image = record.img_url.clone();
                        self.address.image = record.img_url.clone().map(ImageField::Stored);
                        self.existing = Some(record.clone());
                    }
                    None => info!("Candidate saved for org {org_id}"),
                }
                Ok(record)
            }
            Err(e) => {
                warn!("Candidate submission for org {org_id} failed: {e}");
                let message = e.api_message().unwrap_or(SUBMIT_FALLBACK).to_string();
                self.message = Some(message.clone());
                Err(WizardError::Submission { message })
            }
        }
    }

    pub fn view(&self) -> WizardView {
        let mut errors = Vec::new();
        if self.basic_touched {
            errors.extend(self.basic.validate());
        }
        if self.address_touched {
            errors.extend(self.address.validate(self.cascade.cities_available()));
        }

        WizardView {
            step: self.step,
            step_class: self.step.css_class(),
            basic_info: self.basic.clone(),
            address_info: self.address.clone(),
            preview: self.preview.clone(),
            progress: self.progress(),
            countries: self.cascade.countries().to_vec(),
            states: self.cascade.states().to_vec(),
            cities: self.cascade.cities().to_vec(),
            errors,
            submitted: self.submitted,
            message: self.message.clone(),
            org_id: self.org_id,
            existing_candidate_id: self.existing_candidate_id(),
            autosave: self.autosave(),
            has_staged_image: self.staged_image.is_some(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeCandidates, Harness};
    use bytes::Bytes;
    use serde_json::json;

    async fn settle(machine: &mut WizardMachine, harness: &Harness, request: Option<LocationRequest>) {
        if let Some(request) = request {
            let response = fetch(harness.locations.as_ref(), request).await;
            machine.on_locations(response);
        }
    }

    async fn settle_all(machine: &mut WizardMachine, harness: &Harness, requests: Vec<LocationRequest>) {
        for request in requests {
            settle(machine, harness, Some(request)).await;
        }
    }

    async fn fill_basic(machine: &mut WizardMachine) {
        machine
            .edit_basic(BasicInfoPatch {
                name: Some("Asha Rao".into()),
                email: Some("asha@example.com".into()),
                phone: Some("9876543210".into()),
            })
            .await;
    }

    /// Drives a fresh wizard to the preview with India/Karnataka/Bengaluru.
    async fn walk_to_preview(harness: &Harness, org_id: Option<i64>) -> WizardMachine {
        let (mut m, requests) = WizardMachine::mount(harness.deps(), org_id).await;
        assert!(requests.is_empty());
        fill_basic(&mut m).await;
        m.next().await.unwrap();

        let req = m.select_country(Some(1)).await;
        settle(&mut m, harness, req).await;
        let req = m.select_state(Some(5)).await;
        settle(&mut m, harness, req).await;
        m.edit_address(AddressPatch {
            address: Some("12 MG Road".into()),
            pincode: Some("560001".into()),
            city_id: Some(50),
            ..Default::default()
        })
        .await;
        assert_eq!(m.next().await.unwrap(), Step::Preview);
        m
    }

    fn existing_record() -> CandidateRecord {
        CandidateRecord {
            id: 12,
            org_id: Some(3),
            name: "Ravi Kumar".into(),
            email: "ravi@example.com".into(),
            phone: "9000000000".into(),
            address: "4 Park Street".into(),
            country: Some(1),
            state: Some(5),
            city: Some(51),
            pincode: "570001".into(),
            img_url: Some("http://cdn.test/uploads/ravi.png".into()),
        }
    }

    #[tokio::test]
    async fn test_fresh_mount_starts_at_basic_info() {
        let harness = Harness::new();
        let (m, requests) = WizardMachine::mount(harness.deps(), None).await;
        assert_eq!(m.step(), Step::BasicInfo);
        assert!(requests.is_empty());
        assert!(m.autosave());
        assert_eq!(m.cascade().countries().len(), 2);
        assert_eq!(m.progress(), 0);
    }

    #[tokio::test]
    async fn test_basic_step_preserves_values() {
        let harness = Harness::new();
        let (mut m, _) = WizardMachine::mount(harness.deps(), None).await;
        fill_basic(&mut m).await;
        let before = m.basic_info().clone();

        assert_eq!(m.next().await.unwrap(), Step::AddressInfo);
        assert_eq!(m.basic_info(), &before);
        assert_eq!(harness.draft().await.unwrap()["step"], json!(2));
    }

    #[tokio::test]
    async fn test_invalid_basic_info_blocks_and_marks_touched() {
        let harness = Harness::new();
        let (mut m, _) = WizardMachine::mount(harness.deps(), None).await;
        m.edit_basic(BasicInfoPatch {
            name: Some("Asha".into()),
            email: Some("asha-at-example".into()),
            ..Default::default()
        })
        .await;
        let draft_before = harness.draft().await;

        let err = m.next().await.unwrap_err();
        let WizardError::Validation(report) = err else {
            panic!("expected validation error");
        };
        let fields: Vec<_> = report.fields.iter().map(|f| f.field).collect();
        assert_eq!(fields, vec!["email", "phone"]);
        assert_eq!(m.step(), Step::BasicInfo);
        assert_eq!(m.view().errors.len(), 2);
        assert_eq!(harness.draft().await, draft_before);
    }

    #[tokio::test]
    async fn test_pincode_must_have_six_digits() {
        let harness = Harness::new();
        let (mut m, _) = WizardMachine::mount(harness.deps(), None).await;
        fill_basic(&mut m).await;
        m.next().await.unwrap();
        let req = m.select_country(Some(1)).await;
        settle(&mut m, &harness, req).await;
        // Goa has no cities, so no city is required.
        let req = m.select_state(Some(6)).await;
        settle(&mut m, &harness, req).await;
        m.edit_address(AddressPatch {
            address: Some("1 Beach Road".into()),
            pincode: Some("12345".into()),
            ..Default::default()
        })
        .await;

        assert!(matches!(m.next().await, Err(WizardError::Validation(_))));
        assert_eq!(m.step(), Step::AddressInfo);

        m.edit_address(AddressPatch {
            pincode: Some("123456".into()),
            ..Default::default()
        })
        .await;
        assert_eq!(m.next().await.unwrap(), Step::Preview);
        assert_eq!(m.preview().state_name, "Goa");
        assert_eq!(m.preview().city_name, "");
    }

    #[tokio::test]
    async fn test_clearing_city_returns_preview_to_unselected() {
        let harness = Harness::new();
        let mut m = walk_to_preview(&harness, None).await;
        assert_eq!(m.preview().city_name, "Bengaluru");

        m.edit_address(AddressPatch {
            clear_city: true,
            ..Default::default()
        })
        .await;
        assert_eq!(m.address_info().city_id, None);
        assert_eq!(m.preview().city_name, "");
        let draft = harness.draft().await.unwrap();
        assert!(draft["address_info"]["city_id"].is_null());

        m.back().await;
        assert!(matches!(m.next().await, Err(WizardError::Validation(_))));
    }

    #[tokio::test]
    async fn test_city_required_once_city_list_is_loaded() {
        let harness = Harness::new();
        let (mut m, _) = WizardMachine::mount(harness.deps(), None).await;
        fill_basic(&mut m).await;
        m.next().await.unwrap();
        let req = m.select_country(Some(1)).await;
        settle(&mut m, &harness, req).await;
        let req = m.select_state(Some(5)).await;
        settle(&mut m, &harness, req).await;
        m.edit_address(AddressPatch {
            address: Some("12 MG Road".into()),
            pincode: Some("560001".into()),
            ..Default::default()
        })
        .await;

        let Err(WizardError::Validation(report)) = m.next().await else {
            panic!("expected validation error");
        };
        assert_eq!(report.fields[0].field, "city_id");
    }

    #[tokio::test]
    async fn test_forward_flow_resolves_preview_names() {
        let harness = Harness::new();
        let m = walk_to_preview(&harness, None).await;
        let p = m.preview();
        assert_eq!(
            (p.country_name.as_str(), p.state_name.as_str(), p.city_name.as_str()),
            ("India", "Karnataka", "Bengaluru")
        );
        assert_eq!(p.name, "Asha Rao");
        assert_eq!(p.pincode, "560001");
    }

    #[tokio::test]
    async fn test_resume_at_preview_matches_forward_flow() {
        let harness = Harness::new();
        let forward = walk_to_preview(&harness, None).await;
        let expected = forward.preview().clone();
        drop(forward);

        let (mut resumed, requests) = WizardMachine::mount(harness.deps(), None).await;
        assert_eq!(resumed.step(), Step::Preview);
        assert_eq!(requests.len(), 2);
        // Restored verbatim before any list arrives.
        assert_eq!(resumed.preview(), &expected);

        settle_all(&mut resumed, &harness, requests).await;
        assert_eq!(resumed.preview().country_name, expected.country_name);
        assert_eq!(resumed.preview().state_name, expected.state_name);
        assert_eq!(resumed.preview().city_name, expected.city_name);
        assert_eq!(resumed.cascade().cities().len(), 2);
    }

    #[tokio::test]
    async fn test_resume_does_not_revalidate() {
        let harness = Harness::new();
        harness
            .drafts
            .set(
                DRAFT_KEY,
                &json!({
                    "basic_info": {"name": "", "email": "broken", "phone": ""},
                    "address_info": {"pincode": "1"},
                    "step": 3,
                    "preview": {}
                }),
            )
            .await
            .unwrap();

        let (m, requests) = WizardMachine::mount(harness.deps(), None).await;
        assert_eq!(m.step(), Step::Preview);
        assert!(requests.is_empty());
        assert_eq!(m.basic_info().email, "broken");
        assert!(m.view().errors.is_empty());
    }

    #[tokio::test]
    async fn test_unreadable_draft_is_ignored() {
        let harness = Harness::new();
        harness
            .drafts
            .set(DRAFT_KEY, &json!({"step": 9}))
            .await
            .unwrap();
        let (m, _) = WizardMachine::mount(harness.deps(), None).await;
        assert_eq!(m.step(), Step::BasicInfo);
    }

    #[tokio::test]
    async fn test_country_change_clears_state_city_and_names() {
        let harness = Harness::new();
        let mut m = walk_to_preview(&harness, None).await;
        m.back().await;

        let req = m.select_country(Some(2)).await;
        assert_eq!(m.address_info().state_id, None);
        assert_eq!(m.address_info().city_id, None);
        assert!(m.cascade().states().is_empty());
        assert!(m.cascade().cities().is_empty());
        assert_eq!(m.preview().state_name, "");
        assert_eq!(m.preview().city_name, "");
        assert_eq!(m.preview().country_name, "Germany");

        settle(&mut m, &harness, req).await;
        assert_eq!(m.cascade().states()[0].name, "Bavaria");
        let draft = harness.draft().await.unwrap();
        assert_eq!(draft["address_info"]["state_id"], json!(null));
    }

    #[tokio::test]
    async fn test_state_selected_before_states_arrive_keeps_country_list() {
        let harness = Harness::new();
        let (mut m, _) = WizardMachine::mount(harness.deps(), None).await;

        let stale = m.select_country(Some(2)).await.unwrap();
        let states_for_india = m.select_country(Some(1)).await.unwrap();
        let cities_for_karnataka = m.select_state(Some(5)).await.unwrap();

        let india = fetch(harness.locations.as_ref(), states_for_india).await;
        assert!(m.on_locations(india));
        let germany = fetch(harness.locations.as_ref(), stale).await;
        assert!(!m.on_locations(germany));
        let cities = fetch(harness.locations.as_ref(), cities_for_karnataka).await;
        assert!(m.on_locations(cities));

        let names: Vec<_> = m.cascade().states().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Karnataka", "Goa"]);
        assert_eq!(m.address_info().state_id, Some(5));
        assert_eq!(m.preview().state_name, "Karnataka");
    }

    #[tokio::test]
    async fn test_back_transitions_and_set_step_persist_without_validation() {
        let harness = Harness::new();
        let mut m = walk_to_preview(&harness, None).await;

        assert_eq!(m.back().await, Step::AddressInfo);
        assert_eq!(harness.draft().await.unwrap()["step"], json!(2));
        assert_eq!(m.back().await, Step::BasicInfo);
        assert_eq!(harness.draft().await.unwrap()["step"], json!(1));

        m.edit_basic(BasicInfoPatch {
            email: Some("invalid".into()),
            ..Default::default()
        })
        .await;
        m.set_step(Step::Preview).await;
        assert_eq!(m.step(), Step::Preview);
        assert_eq!(harness.draft().await.unwrap()["step"], json!(3));
    }

    #[tokio::test]
    async fn test_every_edit_overwrites_draft() {
        let harness = Harness::new();
        let (mut m, _) = WizardMachine::mount(harness.deps(), None).await;
        m.edit_basic(BasicInfoPatch {
            name: Some("A".into()),
            ..Default::default()
        })
        .await;
        assert_eq!(harness.draft().await.unwrap()["basic_info"]["name"], json!("A"));
        m.edit_basic(BasicInfoPatch {
            name: Some("Ab".into()),
            ..Default::default()
        })
        .await;
        let draft = harness.draft().await.unwrap();
        assert_eq!(draft["basic_info"]["name"], json!("Ab"));
        assert_eq!(draft["preview"]["name"], json!("Ab"));
    }

    #[tokio::test]
    async fn test_staged_image_previews_immediately() {
        let harness = Harness::new();
        let (mut m, _) = WizardMachine::mount(harness.deps(), None).await;
        m.stage_image(StagedImage {
            file_name: "asha.png".into(),
            content_type: "image/png".into(),
            bytes: Bytes::from_static(b"hi"),
        })
        .await;

        assert_eq!(m.step(), Step::BasicInfo);
        assert_eq!(m.preview().image.as_deref(), Some("data:image/png;base64,aGk="));
        assert_eq!(
            m.address_info().image,
            Some(ImageField::Staged("asha.png".into()))
        );
        assert!(m.view().has_staged_image);

        // Later edits keep the image in the preview.
        m.edit_basic(BasicInfoPatch {
            name: Some("Asha".into()),
            ..Default::default()
        })
        .await;
        assert!(m.preview().image.is_some());
    }

    #[tokio::test]
    async fn test_submit_without_org_makes_no_call() {
        let harness = Harness::new();
        let mut m = walk_to_preview(&harness, None).await;

        assert!(matches!(
            m.submit().await,
            Err(WizardError::MissingOrganization)
        ));
        assert_eq!(m.message(), Some("Organization ID missing"));
        assert_eq!(harness.candidates.submission_count(), 0);
        assert!(harness.draft().await.is_some());
    }

    #[tokio::test]
    async fn test_successful_submit_clears_draft_and_swaps_image() {
        let harness = Harness::new();
        let mut m = walk_to_preview(&harness, Some(3)).await;
        m.stage_image(StagedImage {
            file_name: "asha.png".into(),
            content_type: "image/png".into(),
            bytes: Bytes::from_static(b"png"),
        })
        .await;

        let record = m.submit().await.unwrap().unwrap();
        assert_eq!(record.org_id, Some(3));
        assert!(m.submitted());
        assert_eq!(m.message(), Some("Candidate created successfully"));
        assert_eq!(
            m.preview().image.as_deref(),
            Some("http://cdn.test/uploads/asha.png")
        );
        assert!(harness.draft().await.is_none());
        assert!(!m.autosave());

        let sent = harness.candidates.submissions.lock().unwrap()[0].clone();
        assert_eq!(sent.city, Some(50));
        assert_eq!(sent.image.map(|i| i.file_name).as_deref(), Some("asha.png"));
    }

    #[tokio::test]
    async fn test_resubmitting_updates_one_record() {
        let harness = Harness::new();
        let mut m = walk_to_preview(&harness, Some(3)).await;

        let first = m.submit().await.unwrap().unwrap();
        let second = m.submit().await.unwrap().unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(harness.candidates.record_count(), 1);
        assert_eq!(harness.candidates.submission_count(), 2);
        assert_eq!(m.message(), Some("Candidate updated successfully"));
    }

    #[tokio::test]
    async fn test_failed_submit_keeps_draft_for_retry() {
        let harness = Harness::new();
        harness.candidates.fail_with(422, "Email already registered");
        let mut m = walk_to_preview(&harness, Some(3)).await;

        let Err(WizardError::Submission { message }) = m.submit().await else {
            panic!("expected submission error");
        };
        assert_eq!(message, "Email already registered");
        assert!(m.submitted());
        assert_eq!(m.step(), Step::Preview);
        assert!(harness.draft().await.is_some());
    }

    #[tokio::test]
    async fn test_acknowledged_submit_without_record_still_succeeds() {
        let harness = Harness::new();
        harness.candidates.acknowledge_only();
        let mut m = walk_to_preview(&harness, Some(3)).await;
        m.stage_image(StagedImage {
            file_name: "asha.png".into(),
            content_type: "image/png".into(),
            bytes: Bytes::from_static(b"png"),
        })
        .await;

        assert_eq!(m.submit().await.unwrap(), None);
        assert_eq!(m.message(), Some("Candidate created successfully"));
        assert!(harness.draft().await.is_none());
        assert!(m.preview().image.as_deref().unwrap().starts_with("data:image/png"));
        assert!(!m.view().has_staged_image);
    }

    #[tokio::test]
    async fn test_failed_submit_without_message_uses_fallback() {
        let harness = Harness::new();
        harness.candidates.fail_with(500, "");
        let mut m = walk_to_preview(&harness, Some(3)).await;
        m.submit().await.unwrap_err();
        assert_eq!(m.message(), Some("Failed to save candidate"));
    }

    #[tokio::test]
    async fn test_existing_candidate_overrides_draft() {
        let harness = Harness::with_candidates(FakeCandidates::with_record(existing_record()));
        harness
            .drafts
            .set(DRAFT_KEY, &json!({"basic_info": {"name": "Draft"}, "step": 1}))
            .await
            .unwrap();

        let (mut m, requests) = WizardMachine::mount(harness.deps(), Some(3)).await;
        assert!(requests.is_empty());
        assert_eq!(m.step(), Step::Preview);
        assert_eq!(m.existing_candidate_id(), Some(12));
        assert!(!m.autosave());
        assert_eq!(m.basic_info().name, "Ravi Kumar");

        let p = m.preview();
        assert_eq!(
            (p.country_name.as_str(), p.state_name.as_str(), p.city_name.as_str()),
            ("India", "Karnataka", "Mysuru")
        );
        assert_eq!(p.image.as_deref(), Some("http://cdn.test/uploads/ravi.png"));

        // Autosave stays off: the stale draft is left untouched.
        m.back().await;
        assert_eq!(harness.draft().await.unwrap()["basic_info"]["name"], json!("Draft"));
        assert_eq!(
            harness.locations.calls(),
            vec!["countries", "states:1", "cities:5"]
        );
    }

    #[tokio::test]
    async fn test_existing_image_reference_is_resubmitted() {
        let harness = Harness::with_candidates(FakeCandidates::with_record(existing_record()));
        let (mut m, _) = WizardMachine::mount(harness.deps(), Some(3)).await;
        m.submit().await.unwrap();

        let sent = harness.candidates.submissions.lock().unwrap()[0].clone();
        assert_eq!(
            sent.image_ref.as_deref(),
            Some("http://cdn.test/uploads/ravi.png")
        );
        assert!(sent.image.is_none());
    }

    #[tokio::test]
    async fn test_org_id_falls_back_to_stored_auth_session() {
        let harness = Harness::with_candidates(FakeCandidates::with_record(existing_record()));
        harness
            .drafts
            .set(AUTH_KEY, &json!({"id": "3", "org_name": "Acme"}))
            .await
            .unwrap();

        let (m, _) = WizardMachine::mount(harness.deps(), None).await;
        assert_eq!(m.org_id(), Some(3));
        assert_eq!(m.existing_candidate_id(), Some(12));
    }
}
