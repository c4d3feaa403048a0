//! Search request, filter and session token types

use crate::encoding::TokenEncoding;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of search, mapped to the last path segment of a search URL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchType {
    People,
    Company,
}

impl SearchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchType::People => "people",
            SearchType::Company => "company",
        }
    }
}

impl fmt::Display for SearchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "people" => Ok(SearchType::People),
            "company" => Ok(SearchType::Company),
            other => Err(Error::InvalidSearchType(format!(
                "'{}' (expected 'people' or 'company')",
                other
            ))),
        }
    }
}

/// Filter category understood by the search platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FilterType {
    CurrentCompany,
    PastCompany,
    CompanyHeadcount,
    CompanyHeadcountGrowth,
    CompanyHeadquarters,
    CompanyType,
    AnnualRevenue,
    CurrentTitle,
    PastTitle,
    Function,
    SeniorityLevel,
    YearsInCurrentCompany,
    YearsInCurrentPosition,
    YearsOfExperience,
    Region,
    PostalCode,
    Industry,
    School,
    FirstName,
    LastName,
    ProfileLanguage,
    Group,
    Relationship,
    ConnectionOf,
    LeadList,
    AccountList,
    Persona,
}

impl FilterType {
    pub const ALL: [FilterType; 27] = [
        FilterType::CurrentCompany,
        FilterType::PastCompany,
        FilterType::CompanyHeadcount,
        FilterType::CompanyHeadcountGrowth,
        FilterType::CompanyHeadquarters,
        FilterType::CompanyType,
        FilterType::AnnualRevenue,
        FilterType::CurrentTitle,
        FilterType::PastTitle,
        FilterType::Function,
        FilterType::SeniorityLevel,
        FilterType::YearsInCurrentCompany,
        FilterType::YearsInCurrentPosition,
        FilterType::YearsOfExperience,
        FilterType::Region,
        FilterType::PostalCode,
        FilterType::Industry,
        FilterType::School,
        FilterType::FirstName,
        FilterType::LastName,
        FilterType::ProfileLanguage,
        FilterType::Group,
        FilterType::Relationship,
        FilterType::ConnectionOf,
        FilterType::LeadList,
        FilterType::AccountList,
        FilterType::Persona,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FilterType::CurrentCompany => "CURRENT_COMPANY",
            FilterType::PastCompany => "PAST_COMPANY",
            FilterType::CompanyHeadcount => "COMPANY_HEADCOUNT",
            FilterType::CompanyHeadcountGrowth => "COMPANY_HEADCOUNT_GROWTH",
            FilterType::CompanyHeadquarters => "COMPANY_HEADQUARTERS",
            FilterType::CompanyType => "COMPANY_TYPE",
            FilterType::AnnualRevenue => "ANNUAL_REVENUE",
            FilterType::CurrentTitle => "CURRENT_TITLE",
            FilterType::PastTitle => "PAST_TITLE",
            FilterType::Function => "FUNCTION",
            FilterType::SeniorityLevel => "SENIORITY_LEVEL",
            FilterType::YearsInCurrentCompany => "YEARS_IN_CURRENT_COMPANY",
            FilterType::YearsInCurrentPosition => "YEARS_IN_CURRENT_POSITION",
            FilterType::YearsOfExperience => "YEARS_OF_EXPERIENCE",
            FilterType::Region => "REGION",
            FilterType::PostalCode => "POSTAL_CODE",
            FilterType::Industry => "INDUSTRY",
            FilterType::School => "SCHOOL",
            FilterType::FirstName => "FIRST_NAME",
            FilterType::LastName => "LAST_NAME",
            FilterType::ProfileLanguage => "PROFILE_LANGUAGE",
            FilterType::Group => "GROUP",
            FilterType::Relationship => "RELATIONSHIP",
            FilterType::ConnectionOf => "CONNECTION_OF",
            FilterType::LeadList => "LEAD_LIST",
            FilterType::AccountList => "ACCOUNT_LIST",
            FilterType::Persona => "PERSONA",
        }
    }
}

impl fmt::Display for FilterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        FilterType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| Error::InvalidFilter(format!("unknown filter type '{}'", s)))
    }
}

/// Whether a filter value narrows the search to, or away from, a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SelectionType {
    Included,
    Excluded,
}

impl SelectionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SelectionType::Included => "INCLUDED",
            SelectionType::Excluded => "EXCLUDED",
        }
    }
}

impl fmt::Display for SelectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SelectionType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "INCLUDED" => Ok(SelectionType::Included),
            "EXCLUDED" => Ok(SelectionType::Excluded),
            other => Err(Error::InvalidFilter(format!(
                "unknown selection type '{}' (expected INCLUDED or EXCLUDED)",
                other
            ))),
        }
    }
}

/// One entry of a filter
///
/// Entity filters (companies, regions, ...) carry an `id`; free-text filters
/// such as first name only carry `text`. At least one must be present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterValue {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    pub selection_type: SelectionType,
}

impl FilterValue {
    /// Included value with both id and display text
    pub fn included(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            text: Some(text.into()),
            selection_type: SelectionType::Included,
        }
    }

    /// Excluded value with both id and display text
    pub fn excluded(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            text: Some(text.into()),
            selection_type: SelectionType::Excluded,
        }
    }

    fn validate(&self, filter_type: FilterType) -> Result<()> {
        // Empty atoms have no URL form; an empty field would not survive a round trip
        for (field, value) in [("id", &self.id), ("text", &self.text)] {
            if value.as_deref() == Some("") {
                return Err(Error::InvalidFilter(format!(
                    "{} value {} must not be empty",
                    filter_type, field
                )));
            }
        }
        if self.id.is_none() && self.text.is_none() {
            return Err(Error::InvalidFilter(format!(
                "{} value must have an id or text",
                filter_type
            )));
        }
        Ok(())
    }
}

/// Structured search constraint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchFilter {
    #[serde(rename = "type")]
    pub filter_type: FilterType,
    pub values: Vec<FilterValue>,
}

impl SearchFilter {
    pub fn new(filter_type: FilterType, values: Vec<FilterValue>) -> Self {
        Self {
            filter_type,
            values,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.values.is_empty() {
            return Err(Error::InvalidFilter(format!(
                "{} filter has no values",
                self.filter_type
            )));
        }
        for value in &self.values {
            value.validate(self.filter_type)?;
        }
        Ok(())
    }
}

/// Session token in both of its forms
///
/// `encoded` is the parameter text as it appears in the normalized search
/// URL (`Url::parse` escapes bytes such as a literal `'`); `decoded` is the
/// human-inspectable value. Construction always goes through a
/// [`TokenEncoding`], so the two forms are guaranteed to agree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionToken {
    encoded: String,
    decoded: String,
}

impl SessionToken {
    /// Build from the URL-embedded form
    pub fn from_encoded(encoded: impl Into<String>, encoding: &dyn TokenEncoding) -> Result<Self> {
        let encoded = encoded.into();
        let decoded = encoding.decode(&encoded)?;
        Ok(Self { encoded, decoded })
    }

    /// Build from the human form
    pub fn from_decoded(decoded: impl Into<String>, encoding: &dyn TokenEncoding) -> Result<Self> {
        let decoded = decoded.into();
        let encoded = encoding.encode(&decoded)?;
        Ok(Self { encoded, decoded })
    }

    /// Build from caller input of unknown form
    ///
    /// Input containing `%` is taken as already encoded; anything else is
    /// taken as the decoded form and encoded.
    pub fn from_input(input: impl Into<String>, encoding: &dyn TokenEncoding) -> Result<Self> {
        let input = input.into();
        if input.contains('%') {
            Self::from_encoded(input, encoding)
        } else {
            Self::from_decoded(input, encoding)
        }
    }

    pub fn encoded(&self) -> &str {
        &self.encoded
    }

    pub fn decoded(&self) -> &str {
        &self.decoded
    }
}

/// Structured input used to (re)generate a search URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    pub search_type: SearchType,
    pub keywords: String,
    pub filters: Vec<SearchFilter>,
    pub session_token: SessionToken,
}

impl SearchRequest {
    pub fn new(search_type: SearchType, session_token: SessionToken) -> Self {
        Self {
            search_type,
            keywords: String::new(),
            filters: Vec::new(),
            session_token,
        }
    }

    pub fn with_keywords(mut self, keywords: impl Into<String>) -> Self {
        self.keywords = keywords.into();
        self
    }

    pub fn with_filter(mut self, filter: SearchFilter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn validate(&self) -> Result<()> {
        self.filters.iter().try_for_each(SearchFilter::validate)
    }
}
