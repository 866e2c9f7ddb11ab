//! Work workspace: unit scopes, trial balance mapping, statement preview and
//! finalization for a single work.

use std::fmt;

use futures::join;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::models::{
    Account, AccountType, ClientType, Company, ComplianceTemplate, ReportConfig, StatementTemplate,
    TrialBalanceEntry, TrialBalanceVersion, Unit, ValidationStats, Work, WorkStatus,
};
use crate::preview::{RenderedStatement, render_statement};
use crate::sections::Section;
use crate::state::{self, ApiClient, ApiError, Upload};
use crate::validation::{self, ValidationError};

mod finalize;
mod lifetime;
mod pending;

pub use finalize::FinalizeRequest;
pub use lifetime::{ViewLifetime, ViewRegistry};
pub use pending::PendingMapping;

#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error("this work is finalized and can no longer be changed")]
    Locked,
    #[error("select a unit before uploading a trial balance")]
    UnitRequired,
    #[error("entries can only be mapped from the consolidated view")]
    ConsolidatedOnly,
    #[error("trial balance entry {0} is not waiting to be mapped")]
    UnknownEntry(i64),
    #[error("account {0} is not a sub-head")]
    NotSubHead(i64),
    #[error("statement template {0} was not found")]
    UnknownTemplate(i64),
    #[error("a newer view replaced this one before it finished loading")]
    Stale,
}

impl WorkspaceError {
    pub fn user_message(&self) -> String {
        match self {
            WorkspaceError::Api(err) => err.user_message(),
            other => other.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    #[default]
    Mapping,
    Reports,
    Documents,
    Preview,
}

impl ViewMode {
    pub const ALL: [ViewMode; 4] = [
        ViewMode::Mapping,
        ViewMode::Reports,
        ViewMode::Documents,
        ViewMode::Preview,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ViewMode::Mapping => "mapping",
            ViewMode::Reports => "reports",
            ViewMode::Documents => "documents",
            ViewMode::Preview => "preview",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ViewMode::Mapping => "Mapping",
            ViewMode::Reports => "Reports",
            ViewMode::Documents => "Documents",
            ViewMode::Preview => "Preview",
        }
    }

    /// Unknown values fall back to mapping.
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("reports") => ViewMode::Reports,
            Some("documents") => ViewMode::Documents,
            Some("preview") => ViewMode::Preview,
            _ => ViewMode::Mapping,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MappingScope {
    #[default]
    Consolidated,
    Unit(i64),
}

impl MappingScope {
    pub fn parse(value: Option<&str>) -> Self {
        value
            .and_then(|v| v.trim().parse::<i64>().ok())
            .map(MappingScope::Unit)
            .unwrap_or(MappingScope::Consolidated)
    }

    pub fn unit_id(&self) -> Option<i64> {
        match self {
            MappingScope::Unit(id) => Some(*id),
            MappingScope::Consolidated => None,
        }
    }

    pub fn is_consolidated(&self) -> bool {
        matches!(self, MappingScope::Consolidated)
    }
}

/// Query-parameter form: `consolidated` or the unit id.
impl fmt::Display for MappingScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MappingScope::Consolidated => f.write_str("consolidated"),
            MappingScope::Unit(id) => write!(f, "{id}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VersionRow {
    pub version: u32,
    pub row_count: u32,
    pub is_current: bool,
}

/// Newest first; the newest one is the version in use.
pub fn version_rows(versions: &[TrialBalanceVersion]) -> Vec<VersionRow> {
    let mut sorted: Vec<&TrialBalanceVersion> = versions.iter().collect();
    sorted.sort_by(|a, b| b.version.cmp(&a.version));
    sorted
        .into_iter()
        .enumerate()
        .map(|(i, v)| VersionRow {
            version: v.version,
            row_count: v.row_count,
            is_current: i == 0,
        })
        .collect()
}

/// Splits templates into those suited to `client_type` and the rest. A
/// template without a client-type restriction suits everyone. With no known
/// client type only unrestricted templates are recommended.
pub fn partition_templates(
    templates: &[StatementTemplate],
    client_type: Option<ClientType>,
) -> (Vec<&StatementTemplate>, Vec<&StatementTemplate>) {
    templates.iter().partition(|t| {
        t.applicable_client_types.is_empty()
            || client_type.is_some_and(|ct| t.applicable_client_types.contains(&ct))
    })
}

#[derive(Debug, Clone)]
pub struct StatementView {
    pub template_id: i64,
    pub template_name: String,
    pub rendered: RenderedStatement,
}

#[derive(Debug, Clone)]
pub struct DocumentView {
    pub template_id: i64,
    pub template_name: String,
    pub html: String,
}

/// Everything the workspace page shows for one work. The work itself is
/// required; every other part loads on its own and may fail alone.
#[derive(Debug)]
pub struct Workspace {
    pub work: Work,
    pub company: Section<Company>,
    pub unmapped: Section<Vec<TrialBalanceEntry>>,
    pub accounts: Section<Vec<Account>>,
    pub templates: Section<Vec<StatementTemplate>>,
    pub stats: Section<ValidationStats>,
    pub compliance: Section<Vec<ComplianceTemplate>>,
    /// Only fetched in a unit scope.
    pub versions: Section<Vec<TrialBalanceVersion>>,
    pub mode: ViewMode,
    pub scope: MappingScope,
    pub search: String,
    pub statement: Option<StatementView>,
    pub document: Option<DocumentView>,
}

pub async fn load_workspace(
    api: &ApiClient,
    work_id: i64,
    scope: MappingScope,
    lifetime: &ViewLifetime,
) -> Result<Workspace, WorkspaceError> {
    let work = state::get_work_by_id(api, work_id).await?;
    let company = Section::from_result(
        "company",
        state::get_company_by_id(api, work.company_id).await,
    );

    let scope = match scope {
        MappingScope::Unit(id) if !work.units.iter().any(|u| u.id == id) => {
            debug!(work_id, unit_id = id, "unit not part of work, showing consolidated");
            MappingScope::Consolidated
        }
        other => other,
    };

    let versions = async {
        match scope {
            MappingScope::Unit(unit_id) => Some(state::list_unit_versions(api, work_id, unit_id).await),
            MappingScope::Consolidated => None,
        }
    };
    let (unmapped, accounts, templates, stats, compliance, versions) = join!(
        state::list_unmapped_entries(api, work_id),
        state::list_accounts(api),
        state::list_templates(api),
        state::validation_stats(api, work_id),
        state::list_compliance_templates(api),
        versions,
    );

    if !lifetime.is_current() {
        debug!(work_id, "workspace load superseded, discarding");
        return Err(WorkspaceError::Stale);
    }

    Ok(Workspace {
        work,
        company,
        unmapped: Section::from_result("unmapped entries", unmapped),
        accounts: Section::from_result("accounts", accounts),
        templates: Section::from_result("statement templates", templates),
        stats: Section::from_result("validation stats", stats),
        compliance: Section::from_result("compliance templates", compliance),
        versions: versions
            .map(|r| Section::from_result("trial balance versions", r))
            .unwrap_or_default(),
        mode: ViewMode::Mapping,
        scope,
        search: String::new(),
        statement: None,
        document: None,
    })
}

impl Workspace {
    pub fn is_finalized(&self) -> bool {
        self.work.status.is_finalized()
    }

    fn ensure_unlocked(&self) -> Result<(), WorkspaceError> {
        if self.is_finalized() {
            Err(WorkspaceError::Locked)
        } else {
            Ok(())
        }
    }

    pub fn can_map(&self) -> bool {
        !self.is_finalized() && self.scope.is_consolidated()
    }

    pub fn can_upload(&self) -> bool {
        !self.is_finalized() && !self.scope.is_consolidated()
    }

    pub fn selected_unit(&self) -> Option<&Unit> {
        let id = self.scope.unit_id()?;
        self.work.units.iter().find(|u| u.id == id)
    }

    /// Entries offered for mapping. A unit scope is upload-only and offers none.
    pub fn visible_entries(&self) -> Vec<&TrialBalanceEntry> {
        if !self.scope.is_consolidated() {
            return Vec::new();
        }
        let needle = self.search.trim().to_lowercase();
        self.unmapped
            .items()
            .iter()
            .filter(|e| needle.is_empty() || e.account_name.to_lowercase().contains(&needle))
            .collect()
    }

    /// Sub-heads an entry can be mapped to, by name.
    pub fn sub_heads(&self) -> Vec<&Account> {
        let mut subs: Vec<&Account> = self
            .accounts
            .items()
            .iter()
            .filter(|a| a.account_type == AccountType::SubHead)
            .collect();
        subs.sort_by(|a, b| a.name.cmp(&b.name));
        subs
    }

    pub fn version_rows(&self) -> Vec<VersionRow> {
        version_rows(self.versions.items())
    }

    pub fn template_groups(&self) -> (Vec<&StatementTemplate>, Vec<&StatementTemplate>) {
        let client_type = self.company.loaded().map(|c| c.client_type);
        partition_templates(self.templates.items(), client_type)
    }

    /// Removes the entry right away and puts it back at its old position if
    /// the API rejects the mapping.
    pub async fn map_entry(
        &mut self,
        api: &ApiClient,
        entry_id: i64,
        account_id: i64,
    ) -> Result<(), WorkspaceError> {
        self.ensure_unlocked()?;
        if !self.scope.is_consolidated() {
            return Err(WorkspaceError::ConsolidatedOnly);
        }
        if let Some(accounts) = self.accounts.loaded() {
            let is_sub_head = accounts
                .iter()
                .any(|a| a.id == account_id && a.account_type == AccountType::SubHead);
            if !is_sub_head {
                return Err(WorkspaceError::NotSubHead(account_id));
            }
        }
        let pending = self
            .unmapped
            .loaded_mut()
            .and_then(|entries| PendingMapping::take(entries, entry_id, account_id))
            .ok_or(WorkspaceError::UnknownEntry(entry_id))?;

        match state::map_entry(api, self.work.id, entry_id, account_id).await {
            Ok(()) => {
                info!(work_id = self.work.id, entry_id, account_id, "entry mapped");
                Ok(())
            }
            Err(err) => {
                warn!(work_id = self.work.id, entry_id, error = %err, "mapping failed, restoring entry");
                if let Some(entries) = self.unmapped.loaded_mut() {
                    pending.restore(entries);
                }
                Err(err.into())
            }
        }
    }

    pub async fn upload_trial_balance(
        &mut self,
        api: &ApiClient,
        file: Option<Upload>,
    ) -> Result<(), WorkspaceError> {
        self.ensure_unlocked()?;
        let unit_id = self.scope.unit_id().ok_or(WorkspaceError::UnitRequired)?;
        let file = file
            .filter(|f| !f.is_empty())
            .ok_or(ValidationError::Required("trial balance file"))?;

        state::upload_trial_balance(api, self.work.id, unit_id, file).await?;
        info!(work_id = self.work.id, unit_id, "trial balance uploaded");

        let (unmapped, stats, versions) = join!(
            state::list_unmapped_entries(api, self.work.id),
            state::validation_stats(api, self.work.id),
            state::list_unit_versions(api, self.work.id, unit_id),
        );
        self.unmapped = Section::from_result("unmapped entries", unmapped);
        self.stats = Section::from_result("validation stats", stats);
        self.versions = Section::from_result("trial balance versions", versions);
        Ok(())
    }

    pub async fn create_unit(&mut self, api: &ApiClient, name: &str) -> Result<Unit, WorkspaceError> {
        self.ensure_unlocked()?;
        let name = validation::required("unit name", name)?;
        let unit = state::create_unit(api, self.work.id, &name).await?;
        info!(work_id = self.work.id, unit_id = unit.id, "unit created");
        self.work.units.push(unit.clone());
        Ok(unit)
    }

    pub async fn finalize(&mut self, api: &ApiClient, request: FinalizeRequest) -> Result<(), WorkspaceError> {
        self.ensure_unlocked()?;
        let FinalizeRequest {
            udin,
            signing_date,
            certificate,
        } = request;
        state::finalize_work(api, self.work.id, &udin, signing_date, certificate).await?;
        info!(work_id = self.work.id, "work finalized");
        self.work.status = WorkStatus::Finalized;
        self.work.udin = Some(udin);
        self.work.signing_date = Some(signing_date);
        Ok(())
    }

    /// Computes the statement for `template_id` and switches to the preview.
    /// Saved note text is optional; without it the narratives start empty.
    pub async fn preview_statement(&mut self, api: &ApiClient, template_id: i64) -> Result<(), WorkspaceError> {
        let template_name = match self.templates.loaded() {
            Some(list) => list
                .iter()
                .find(|t| t.id == template_id)
                .map(|t| t.name.clone())
                .ok_or(WorkspaceError::UnknownTemplate(template_id))?,
            None => format!("Template #{template_id}"),
        };

        let (preview, config) = join!(
            state::preview_statement(api, self.work.id, template_id),
            state::get_report_config(api, self.work.id),
        );
        let preview = preview?;
        let config = Section::from_result("report config", config).or_empty();

        self.statement = Some(StatementView {
            template_id,
            template_name,
            rendered: render_statement(&preview, &config.custom_notes),
        });
        self.mode = ViewMode::Preview;
        Ok(())
    }

    pub async fn preview_document(&mut self, api: &ApiClient, template_id: i64) -> Result<(), WorkspaceError> {
        let rendered = state::preview_document(api, self.work.id, template_id).await?;
        let template_name = self
            .compliance
            .items()
            .iter()
            .find(|t| t.id == template_id)
            .map(|t| t.name.clone())
            .unwrap_or_else(|| format!("Document #{template_id}"));
        self.document = Some(DocumentView {
            template_id,
            template_name,
            html: rendered.html,
        });
        self.mode = ViewMode::Documents;
        Ok(())
    }
}

/// Stores the narrative for one note, keeping every other saved note.
/// Blank text removes the note.
pub async fn save_note(
    api: &ApiClient,
    work_id: i64,
    note_ref: &str,
    text: &str,
) -> Result<ReportConfig, WorkspaceError> {
    let note_ref = validation::required("note reference", note_ref)?;
    let mut config = state::get_report_config(api, work_id).await?;
    merge_note(&mut config, &note_ref, text);
    state::save_report_config(api, work_id, &config).await?;
    debug!(work_id, note_ref = %note_ref, "note saved");
    Ok(config)
}

fn merge_note(config: &mut ReportConfig, note_ref: &str, text: &str) {
    let text = text.trim();
    if text.is_empty() {
        config.custom_notes.remove(note_ref);
    } else {
        config
            .custom_notes
            .insert(note_ref.to_string(), text.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CategoryType, StatementType};
    use chrono::NaiveDate;

    fn work(status: WorkStatus) -> Work {
        Work {
            id: 12,
            company_id: 3,
            start_date: NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2025, 3, 31).unwrap(),
            status,
            units: vec![
                Unit {
                    id: 1,
                    unit_name: "Mumbai".into(),
                },
                Unit {
                    id: 2,
                    unit_name: "Delhi".into(),
                },
            ],
            udin: None,
            signing_date: None,
        }
    }

    fn entry(id: i64, name: &str, unit: i64) -> TrialBalanceEntry {
        TrialBalanceEntry {
            id,
            account_name: name.into(),
            debit: 100.0,
            credit: 0.0,
            closing_balance: 100.0,
            unit_id: Some(unit),
        }
    }

    fn workspace(status: WorkStatus, scope: MappingScope) -> Workspace {
        Workspace {
            work: work(status),
            company: Section::Empty,
            unmapped: Section::Loaded(vec![
                entry(101, "Cash at Mumbai", 1),
                entry(201, "Rent Delhi", 2),
            ]),
            accounts: Section::Loaded(vec![Account {
                id: 40,
                name: "Cash in Hand".into(),
                account_type: AccountType::SubHead,
                category_type: CategoryType::Asset,
                parent_id: Some(4),
            }]),
            templates: Section::Empty,
            stats: Section::Empty,
            compliance: Section::Empty,
            versions: Section::Empty,
            mode: ViewMode::Mapping,
            scope,
            search: String::new(),
            statement: None,
            document: None,
        }
    }

    // Nothing listens here; tests below must fail before any request is sent.
    fn offline() -> ApiClient {
        ApiClient::new("http://127.0.0.1:9").unwrap()
    }

    fn template(id: i64, types: Vec<ClientType>) -> StatementTemplate {
        StatementTemplate {
            id,
            name: format!("T{id}"),
            statement_type: StatementType::BalanceSheet,
            template_definition: vec![],
            applicable_client_types: types,
        }
    }

    #[test]
    fn query_params_round_trip() {
        for mode in ViewMode::ALL {
            assert_eq!(ViewMode::parse(Some(mode.as_str())), mode);
        }
        assert_eq!(ViewMode::parse(Some("bogus")), ViewMode::Mapping);
        assert_eq!(MappingScope::parse(Some("7")), MappingScope::Unit(7));
        assert_eq!(MappingScope::parse(Some("consolidated")), MappingScope::Consolidated);
        assert_eq!(MappingScope::Unit(7).to_string(), "7");
    }

    #[test]
    fn consolidated_shows_union_and_unit_scope_shows_nothing() {
        let mut ws = workspace(WorkStatus::Active, MappingScope::Consolidated);
        assert_eq!(ws.visible_entries().len(), 2);
        ws.search = "delhi".into();
        let ids: Vec<_> = ws.visible_entries().iter().map(|e| e.id).collect();
        assert_eq!(ids, [201]);

        let ws = workspace(WorkStatus::Active, MappingScope::Unit(1));
        assert!(ws.visible_entries().is_empty());
        assert!(!ws.can_map());
        assert!(ws.can_upload());
        assert_eq!(ws.selected_unit().map(|u| u.unit_name.as_str()), Some("Mumbai"));
    }

    #[test]
    fn versions_newest_first_with_current_tag() {
        let rows = version_rows(&[
            TrialBalanceVersion {
                version: 1,
                row_count: 40,
            },
            TrialBalanceVersion {
                version: 3,
                row_count: 42,
            },
            TrialBalanceVersion {
                version: 2,
                row_count: 41,
            },
        ]);
        let order: Vec<_> = rows.iter().map(|r| r.version).collect();
        assert_eq!(order, [3, 2, 1]);
        assert!(rows[0].is_current);
        assert!(rows[1..].iter().all(|r| !r.is_current));
    }

    #[test]
    fn templates_partition_by_client_type() {
        let templates = vec![
            template(1, vec![]),
            template(2, vec![ClientType::Llp]),
            template(3, vec![ClientType::Company, ClientType::Llp]),
        ];
        let (recommended, other) = partition_templates(&templates, Some(ClientType::Company));
        let ids: Vec<_> = recommended.iter().map(|t| t.id).collect();
        assert_eq!(ids, [1, 3]);
        assert_eq!(other[0].id, 2);

        let (recommended, _) = partition_templates(&templates, None);
        assert_eq!(recommended.len(), 1);
    }

    #[tokio::test]
    async fn finalized_work_refuses_changes_before_any_request() {
        let api = offline();
        let mut ws = workspace(WorkStatus::Finalized, MappingScope::Consolidated);
        assert!(matches!(
            ws.map_entry(&api, 101, 40).await,
            Err(WorkspaceError::Locked)
        ));
        assert_eq!(ws.unmapped.len(), 2);
        assert!(matches!(
            ws.create_unit(&api, "Pune").await,
            Err(WorkspaceError::Locked)
        ));
        ws.scope = MappingScope::Unit(1);
        assert!(matches!(
            ws.upload_trial_balance(&api, None).await,
            Err(WorkspaceError::Locked)
        ));
    }

    #[tokio::test]
    async fn scope_rules_are_checked_locally() {
        let api = offline();
        let mut ws = workspace(WorkStatus::Active, MappingScope::Unit(1));
        assert!(matches!(
            ws.map_entry(&api, 101, 40).await,
            Err(WorkspaceError::ConsolidatedOnly)
        ));

        ws.scope = MappingScope::Consolidated;
        assert!(matches!(
            ws.upload_trial_balance(&api, None).await,
            Err(WorkspaceError::UnitRequired)
        ));
        assert!(matches!(
            ws.map_entry(&api, 101, 999).await,
            Err(WorkspaceError::NotSubHead(999))
        ));
        assert!(matches!(
            ws.create_unit(&api, "   ").await,
            Err(WorkspaceError::Invalid(ValidationError::Required("unit name")))
        ));
    }

    #[tokio::test]
    async fn failed_mapping_puts_entry_back() {
        let api = offline();
        let mut ws = workspace(WorkStatus::Active, MappingScope::Consolidated);
        let before = ws.unmapped.items().to_vec();
        let result = ws.map_entry(&api, 101, 40).await;
        assert!(matches!(result, Err(WorkspaceError::Api(_))));
        assert_eq!(ws.unmapped.items(), before.as_slice());
    }

    #[test]
    fn blank_note_text_removes_the_note() {
        let mut config = ReportConfig::default();
        merge_note(&mut config, "3", "  Held at head office ");
        merge_note(&mut config, "4", "Secured loans");
        assert_eq!(config.custom_notes["3"], "Held at head office");
        merge_note(&mut config, "4", "");
        assert!(!config.custom_notes.contains_key("4"));
        assert_eq!(config.custom_notes.len(), 1);
    }
}
