// models.rs
// Wire models for the remote accounting API. The server owns every record;
// these are the transient copies a page holds while it renders.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// User roles for authorization.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum UserRole {
    Admin,
    #[default]
    Staff,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "ADMIN",
            UserRole::Staff => "STAFF",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, UserRole::Admin)
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "ADMIN" => Some(UserRole::Admin),
            "STAFF" => Some(UserRole::Staff),
            _ => None,
        }
    }
}

/// Body of `POST /auth/login`.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub user_id: i64,
    pub role: UserRole,
}

/// The user record kept next to the credential for the lifetime of a session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserRecord {
    pub user_id: i64,
    /// Username the session was opened with.
    pub sub: String,
    pub role: UserRole,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyRef {
    pub id: i64,
    pub legal_name: String,
}

/// Row of `GET /auth/users`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaffUser {
    pub id: i64,
    pub username: String,
    pub role: UserRole,
    #[serde(default)]
    pub assigned_companies: Vec<CompanyRef>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewStaffUser {
    pub username: String,
    pub password: String,
    pub role: UserRole,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientType {
    Company,
    Llp,
    Partnership,
    Proprietorship,
    Trust,
    Society,
    Individual,
    #[serde(other)]
    Other,
}

impl ClientType {
    pub const ALL: [ClientType; 7] = [
        ClientType::Company,
        ClientType::Llp,
        ClientType::Partnership,
        ClientType::Proprietorship,
        ClientType::Trust,
        ClientType::Society,
        ClientType::Individual,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ClientType::Company => "COMPANY",
            ClientType::Llp => "LLP",
            ClientType::Partnership => "PARTNERSHIP",
            ClientType::Proprietorship => "PROPRIETORSHIP",
            ClientType::Trust => "TRUST",
            ClientType::Society => "SOCIETY",
            ClientType::Individual => "INDIVIDUAL",
            ClientType::Other => "OTHER",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ClientType::Company => "Company",
            ClientType::Llp => "LLP",
            ClientType::Partnership => "Partnership Firm",
            ClientType::Proprietorship => "Proprietorship",
            ClientType::Trust => "Trust",
            ClientType::Society => "Society",
            ClientType::Individual => "Individual",
            ClientType::Other => "Other",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.as_str().eq_ignore_ascii_case(value.trim()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Company {
    pub id: i64,
    pub legal_name: String,
    pub client_type: ClientType,
    #[serde(default)]
    pub cin: Option<String>,
    #[serde(default)]
    pub pan: Option<String>,
    #[serde(default)]
    pub tan: Option<String>,
    #[serde(default)]
    pub gstin: Option<String>,
    #[serde(default)]
    pub registered_address: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewCompany {
    pub legal_name: String,
    pub client_type: ClientType,
    pub cin: Option<String>,
    pub pan: Option<String>,
    pub tan: Option<String>,
    pub gstin: Option<String>,
    pub registered_address: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signatory {
    pub id: i64,
    pub company_id: i64,
    pub name: String,
    #[serde(default)]
    pub designation: String,
    #[serde(default)]
    pub din_number: Option<String>,
    #[serde(default)]
    pub pan_number: Option<String>,
}

impl Signatory {
    /// DIN when present, otherwise PAN.
    pub fn identifier(&self) -> String {
        match (&self.din_number, &self.pan_number) {
            (Some(din), _) if !din.is_empty() => format!("DIN: {din}"),
            (_, Some(pan)) if !pan.is_empty() => format!("PAN: {pan}"),
            _ => String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NewSignatory {
    pub company_id: i64,
    pub name: String,
    pub designation: String,
    pub din_number: Option<String>,
    pub pan_number: Option<String>,
}

pub const DESIGNATIONS: [&str; 5] = ["Director", "Managing Director", "Partner", "Proprietor", "CEO"];

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum WorkStatus {
    #[default]
    #[serde(alias = "PENDING")]
    Pending,
    #[serde(alias = "ACTIVE")]
    Active,
    #[serde(alias = "FINALIZED")]
    Finalized,
    #[serde(other)]
    Other,
}

impl WorkStatus {
    pub fn is_finalized(&self) -> bool {
        matches!(self, WorkStatus::Finalized)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WorkStatus::Pending => "pending",
            WorkStatus::Active => "active",
            WorkStatus::Finalized => "finalized",
            WorkStatus::Other => "unknown",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Unit {
    pub id: i64,
    pub unit_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Work {
    pub id: i64,
    pub company_id: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub status: WorkStatus,
    #[serde(default)]
    pub units: Vec<Unit>,
    #[serde(default)]
    pub udin: Option<String>,
    #[serde(default)]
    pub signing_date: Option<NaiveDate>,
}

impl Work {
    pub fn period_label(&self) -> String {
        format!(
            "{} to {}",
            self.start_date.format("%d %b %Y"),
            self.end_date.format("%d %b %Y")
        )
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NewWork {
    pub company_id: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// One trial balance upload of a unit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrialBalanceVersion {
    pub version: u32,
    pub row_count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrialBalanceEntry {
    pub id: i64,
    pub account_name: String,
    #[serde(default)]
    pub debit: f64,
    #[serde(default)]
    pub credit: f64,
    #[serde(default)]
    pub closing_balance: f64,
    #[serde(default)]
    pub unit_id: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ValidationStats {
    #[serde(default)]
    pub total_entries: u32,
    #[serde(default)]
    pub mapped_entries: u32,
    #[serde(default)]
    pub unmapped_entries: u32,
    #[serde(default)]
    pub total_debit: f64,
    #[serde(default)]
    pub total_credit: f64,
}

impl ValidationStats {
    pub fn is_balanced(&self) -> bool {
        (self.total_debit - self.total_credit).abs() < 0.005
    }

    pub fn ready_for_reporting(&self) -> bool {
        self.unmapped_entries == 0 && self.is_balanced()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountType {
    Category,
    Head,
    SubHead,
}

impl AccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Category => "CATEGORY",
            AccountType::Head => "HEAD",
            AccountType::SubHead => "SUB_HEAD",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "CATEGORY" => Some(AccountType::Category),
            "HEAD" => Some(AccountType::Head),
            "SUB_HEAD" => Some(AccountType::SubHead),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum CategoryType {
    Asset,
    Liability,
    Equity,
    Income,
    Expense,
}

impl CategoryType {
    pub const ALL: [CategoryType; 5] = [
        CategoryType::Asset,
        CategoryType::Liability,
        CategoryType::Equity,
        CategoryType::Income,
        CategoryType::Expense,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryType::Asset => "ASSET",
            CategoryType::Liability => "LIABILITY",
            CategoryType::Equity => "EQUITY",
            CategoryType::Income => "INCOME",
            CategoryType::Expense => "EXPENSE",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.as_str() == value.trim())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Account {
    pub id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub account_type: AccountType,
    pub category_type: CategoryType,
    #[serde(default)]
    pub parent_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewAccount {
    pub name: String,
    #[serde(rename = "type")]
    pub account_type: AccountType,
    pub category_type: CategoryType,
    pub parent_id: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BulkUploadSummary {
    #[serde(default)]
    pub sub_heads_processed: u32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatementType {
    BalanceSheet,
    ProfitLoss,
    CashFlow,
    FullSet,
}

impl StatementType {
    pub const ALL: [StatementType; 4] = [
        StatementType::BalanceSheet,
        StatementType::ProfitLoss,
        StatementType::CashFlow,
        StatementType::FullSet,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StatementType::BalanceSheet => "BALANCE_SHEET",
            StatementType::ProfitLoss => "PROFIT_LOSS",
            StatementType::CashFlow => "CASH_FLOW",
            StatementType::FullSet => "FULL_SET",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            StatementType::BalanceSheet => "Balance Sheet",
            StatementType::ProfitLoss => "Profit & Loss",
            StatementType::CashFlow => "Cash Flow",
            StatementType::FullSet => "Full Set",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| t.as_str() == value.trim())
    }
}

/// One entry of a statement template definition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TemplateBlock {
    HeaderBlock {
        #[serde(default)]
        text: String,
    },
    Title {
        #[serde(default)]
        text: String,
    },
    FinancialLineItem {
        #[serde(default)]
        label: String,
        #[serde(default)]
        account_head_id: i64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        note_ref: Option<String>,
        #[serde(default)]
        mandatory: bool,
    },
    Subtotal {
        #[serde(default)]
        label: String,
        #[serde(default)]
        id: i64,
        #[serde(default)]
        mandatory: bool,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatementTemplate {
    pub id: i64,
    pub name: String,
    pub statement_type: StatementType,
    #[serde(default)]
    pub template_definition: Vec<TemplateBlock>,
    /// Empty means the template applies to every client type.
    #[serde(default)]
    pub applicable_client_types: Vec<ClientType>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TemplatePayload {
    pub name: String,
    pub statement_type: StatementType,
    pub template_definition: Vec<TemplateBlock>,
    pub applicable_client_types: Vec<ClientType>,
}

/// One entry of a compliance document definition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DocBlock {
    Text {
        #[serde(default)]
        content: String,
    },
    Signatories {
        #[serde(default)]
        title: String,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplianceTemplate {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub template_definition: Option<Vec<DocBlock>>,
    #[serde(default)]
    pub content_html: Option<String>,
}

impl ComplianceTemplate {
    /// Blocks for the editor; legacy records carrying only HTML open as one text block.
    pub fn blocks(&self) -> Vec<DocBlock> {
        match (&self.template_definition, &self.content_html) {
            (Some(blocks), _) if !blocks.is_empty() => blocks.clone(),
            (_, Some(html)) if !html.is_empty() => vec![DocBlock::Text {
                content: html.clone(),
            }],
            _ => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CompliancePayload {
    pub name: String,
    pub template_definition: Vec<DocBlock>,
    pub content_html: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RenderedDocument {
    pub html: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedSummary {
    #[serde(default)]
    pub templates_added: u32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct AmountPair {
    #[serde(default)]
    pub current: f64,
    #[serde(default)]
    pub previous: f64,
}

/// A computed balance; the API sends either a bare amount or a current/previous pair.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Balance {
    Amount(f64),
    Pair(AmountPair),
}

impl Balance {
    pub fn current(&self) -> f64 {
        match self {
            Balance::Amount(v) => *v,
            Balance::Pair(p) => p.current,
        }
    }

    pub fn previous(&self) -> f64 {
        match self {
            Balance::Amount(_) => 0.0,
            Balance::Pair(p) => p.previous,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NoteLine {
    pub name: String,
    #[serde(default)]
    pub current: f64,
    #[serde(default)]
    pub previous: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NoteGroup {
    pub note_ref: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub children: Vec<NoteLine>,
}

/// Body of `GET /works/{id}/preview/{templateId}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatementPreview {
    #[serde(default)]
    pub template_definition: Vec<TemplateBlock>,
    /// Keyed by account head id for line items and by subtotal id for subtotals.
    #[serde(default)]
    pub balances: HashMap<i64, Balance>,
    #[serde(default)]
    pub notes: Vec<NoteGroup>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportConfig {
    #[serde(default)]
    pub custom_notes: HashMap<String, String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FirmSettings {
    #[serde(default)]
    pub firm_name: String,
    #[serde(default)]
    pub firm_registration_number: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub address: String,
}
