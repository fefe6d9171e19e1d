//! Report generation
//!
//! Reports are assembled from in-memory data and handed to a renderer that
//! turns them into a downloadable document. Renderers only lay the numbers
//! out; every count and row comes from the report itself.

use chrono::{DateTime, NaiveDate, Utc};
use csv::WriterBuilder;
use serde::Serialize;
use std::fmt::Write;

use crate::models::{Activity, EventPlan};
use crate::services::attendance::Participant;
use crate::utils::errors::{EventusError, Result};
use crate::utils::helpers::{format_generated_at, format_long_date, slugify};

const PRESENT_LABEL: &str = "Presente";
const ABSENT_LABEL: &str = "Ausente";

/// One line of the attendance list
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRow {
    pub name: String,
    pub email: String,
    pub present: bool,
}

impl AttendanceRow {
    pub fn status(&self) -> &'static str {
        if self.present {
            PRESENT_LABEL
        } else {
            ABSENT_LABEL
        }
    }
}

/// Attendance list of one activity
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceReport {
    pub activity_name: String,
    pub activity_date: Option<NaiveDate>,
    pub rows: Vec<AttendanceRow>,
    pub present_count: usize,
    pub absent_count: usize,
    pub generated_at: DateTime<Utc>,
}

impl AttendanceReport {
    /// Counts are taken from `participants`, which may be a filtered subset
    pub fn build(activity: &Activity, participants: &[&Participant], generated_at: DateTime<Utc>) -> Self {
        let rows: Vec<AttendanceRow> = participants
            .iter()
            .map(|p| AttendanceRow {
                name: p.user_name.clone(),
                email: p.email.clone(),
                present: p.present,
            })
            .collect();
        let present_count = rows.iter().filter(|r| r.present).count();

        Self {
            activity_name: activity.name.clone(),
            activity_date: activity.activity_date,
            absent_count: rows.len() - present_count,
            present_count,
            rows,
            generated_at,
        }
    }

    fn formatted_date(&self) -> String {
        self.activity_date
            .map(format_long_date)
            .unwrap_or_else(|| "-".to_string())
    }
}

/// A rendered document ready to be sent as a download
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedDocument {
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
    pub file_name: String,
}

/// Turns an attendance report into a document
pub trait ReportRenderer: Send + Sync {
    fn render(&self, report: &AttendanceReport) -> Result<RenderedDocument>;
}

/// Activity and date records, the participant table, then the totals
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvRenderer;

impl ReportRenderer for CsvRenderer {
    fn render(&self, report: &AttendanceReport) -> Result<RenderedDocument> {
        // Summary records have two fields, the table has three
        let mut writer = WriterBuilder::new().flexible(true).from_writer(Vec::new());

        writer.write_record(["Atividade", report.activity_name.as_str()])?;
        writer.write_record(["Data", report.formatted_date().as_str()])?;
        writer.write_record(["nome", "email", "status"])?;
        for row in &report.rows {
            writer.write_record([row.name.as_str(), row.email.as_str(), row.status()])?;
        }
        writer.write_record(["Total de Presentes", report.present_count.to_string().as_str()])?;
        writer.write_record(["Total de Ausentes", report.absent_count.to_string().as_str()])?;

        let bytes = writer
            .into_inner()
            .map_err(|e| EventusError::Io(e.into_error()))?;

        Ok(RenderedDocument {
            bytes,
            content_type: "text/csv; charset=utf-8",
            file_name: "lista_de_presenca.csv".to_string(),
        })
    }
}

/// Fixed-width table for printing
#[derive(Debug, Clone, Copy, Default)]
pub struct TextRenderer;

impl ReportRenderer for TextRenderer {
    fn render(&self, report: &AttendanceReport) -> Result<RenderedDocument> {
        let name_width = column_width("Nome", report.rows.iter().map(|r| r.name.as_str()));
        let email_width = column_width("Email", report.rows.iter().map(|r| r.email.as_str()));

        let mut out = String::new();
        let _ = writeln!(out, "Lista de Presença");
        let _ = writeln!(out, "Atividade: {}", report.activity_name);
        let _ = writeln!(out, "Data: {}", report.formatted_date());
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "{:<nw$}  {:<ew$}  Status",
            "Nome",
            "Email",
            nw = name_width,
            ew = email_width
        );
        let _ = writeln!(out, "{}", "-".repeat(name_width + email_width + 12));
        for row in &report.rows {
            let _ = writeln!(
                out,
                "{:<nw$}  {:<ew$}  {}",
                row.name,
                row.email,
                row.status(),
                nw = name_width,
                ew = email_width
            );
        }
        let _ = writeln!(out);
        let _ = writeln!(out, "Total de Presentes: {}", report.present_count);
        let _ = writeln!(out, "Total de Ausentes: {}", report.absent_count);
        let _ = writeln!(out, "Gerado por Eventus em {}", format_generated_at(report.generated_at));

        Ok(RenderedDocument {
            bytes: out.into_bytes(),
            content_type: "text/plain; charset=utf-8",
            file_name: "lista_de_presenca.txt".to_string(),
        })
    }
}

fn column_width<'a>(header: &str, values: impl Iterator<Item = &'a str>) -> usize {
    values
        .map(|v| v.chars().count())
        .chain(std::iter::once(header.chars().count()))
        .max()
        .unwrap_or(0)
}

/// Planning sheet of an event plan
#[derive(Debug, Clone)]
pub struct EventPlanReport<'a> {
    plan: &'a EventPlan,
    generated_at: DateTime<Utc>,
}

impl<'a> EventPlanReport<'a> {
    pub fn new(plan: &'a EventPlan, generated_at: DateTime<Utc>) -> Self {
        Self { plan, generated_at }
    }

    /// `planejamento-<slug>.txt`
    pub fn file_name(&self) -> String {
        format!("planejamento-{}.txt", slugify(&self.plan.name))
    }

    pub fn render(&self) -> RenderedDocument {
        let mut out = String::new();
        let _ = writeln!(out, "EVENTUS");
        let _ = writeln!(out, "Planejamento de Evento");
        let _ = writeln!(out);
        let _ = writeln!(out, "Nome do Planejamento: {}", self.plan.name);
        let _ = writeln!(out, "Data do Evento: {}", format_long_date(self.plan.event_date));
        let _ = writeln!(out, "Quantidade de Microfones: {}", self.plan.microphones);
        let _ = writeln!(out, "Quantidade de Projetores: {}", self.plan.projectors);
        let _ = writeln!(out);
        numbered_section(&mut out, "Salas", &self.plan.room_list());
        let _ = writeln!(out);
        numbered_section(&mut out, "Membros da Equipe", &self.plan.member_list());
        let _ = writeln!(out);
        let _ = writeln!(out, "Gerado por Eventus em {}", format_generated_at(self.generated_at));

        RenderedDocument {
            bytes: out.into_bytes(),
            content_type: "text/plain; charset=utf-8",
            file_name: self.file_name(),
        }
    }
}

fn numbered_section(out: &mut String, title: &str, lines: &[&str]) {
    let _ = writeln!(out, "{}", title);
    for (index, line) in lines.iter().enumerate() {
        let _ = writeln!(out, "  {}. {}", index + 1, line);
    }
}
