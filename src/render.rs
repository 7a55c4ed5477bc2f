// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Renderer
//!
//! Pure function of `(session, view, alert, drafts)` to a [`UiTree`]: the
//! widgets of the active screen plus the controls currently bound. The tree
//! is rebuilt from scratch on every render, so the binding table is
//! idempotent under repeated renders and a control from a previous view
//! cannot survive a transition. Commands are dispatched against this table:
//! controls of inactive views are simply absent from it.

use crate::alert::AlertMessage;
use crate::models::{Certificate, CertificateId};
use crate::router::ViewState;
use crate::session::Session;
use crate::state::{FormField, RegistrationForm, VerifyForm};

/// Identity of an interactive control. Revoke controls are bound per
/// displayed row, so only ids actually rendered can be revoked.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ControlId {
    LoginButton,
    LogoutLink,
    NavAdmin,
    NavVerify,
    Field(FormField),
    RegisterFile,
    RegisterSubmit,
    ViewAllButton,
    VerifyFile,
    VerifySubmit,
    Revoke(CertificateId),
    BackToVerify,
    BackToAdmin,
}

/// A bound control with its user-facing label and command hint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Control {
    pub id: ControlId,
    pub label: &'static str,
    pub usage: &'static str,
}

impl Control {
    fn new(id: ControlId, label: &'static str, usage: &'static str) -> Self {
        Self { id, label, usage }
    }
}

/// Display widgets of the active screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Widget {
    Heading(String),
    Paragraph(String),
    /// A metadata form field with its current draft value.
    Field { label: &'static str, value: String },
    /// The file-selection slot of a form.
    FileSlot { label: &'static str, path: Option<String> },
    /// Verification verdict panel.
    ResultPanel { valid: bool, message: String },
    /// Key/value details of a verified certificate.
    Details(Vec<(&'static str, String)>),
    /// One row per registered certificate.
    CertificateRow {
        id: CertificateId,
        name: String,
        issued_to: String,
        issuer: String,
        issue_date: String,
    },
    Notice(String),
}

/// The rendered UI: alert slot, navigation, body, and the binding table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiTree {
    pub view: &'static str,
    pub alert: Option<AlertMessage>,
    pub nav: Vec<Control>,
    pub body: Vec<Widget>,
    pub controls: Vec<Control>,
}

impl UiTree {
    /// Whether `id` is bound in this tree (navigation included).
    pub fn is_bound(&self, id: &ControlId) -> bool {
        self.nav.iter().chain(self.controls.iter()).any(|c| &c.id == id)
    }

    /// The bound revoke targets, in display order.
    pub fn revocable_ids(&self) -> Vec<&CertificateId> {
        self.controls
            .iter()
            .filter_map(|c| match &c.id {
                ControlId::Revoke(id) => Some(id),
                _ => None,
            })
            .collect()
    }
}

/// Render the current state. Pure: no side effects, no mutation.
pub fn render(
    session: &Session,
    view: &ViewState,
    alert: Option<&AlertMessage>,
    registration: &RegistrationForm,
    verify: &VerifyForm,
) -> UiTree {
    let mut nav = Vec::new();
    if session.is_authenticated() {
        if session.is_admin() {
            nav.push(Control::new(ControlId::NavAdmin, "Admin Panel", "nav admin"));
        }
        nav.push(Control::new(
            ControlId::NavVerify,
            "Verify Certificate",
            "nav verify",
        ));
        nav.push(Control::new(ControlId::LogoutLink, "Logout", "logout"));
    }

    let (body, controls) = match view {
        ViewState::Login => login_view(),
        ViewState::Admin => admin_view(registration),
        ViewState::Verify => verify_view(verify),
        ViewState::Results(result) => results_view(result),
        ViewState::CertificatesList(certificates) => certificates_view(certificates),
    };

    UiTree {
        view: view.name(),
        alert: alert.cloned(),
        nav,
        body,
        controls,
    }
}

fn login_view() -> (Vec<Widget>, Vec<Control>) {
    let body = vec![
        Widget::Heading("Welcome to Certificate Verification System".into()),
        Widget::Paragraph(
            "This system allows you to verify the authenticity of digital certificates.".into(),
        ),
    ];
    let controls = vec![Control::new(ControlId::LoginButton, "Login", "login")];
    (body, controls)
}

fn admin_view(registration: &RegistrationForm) -> (Vec<Widget>, Vec<Control>) {
    let meta = &registration.metadata;
    let body = vec![
        Widget::Heading("Admin Dashboard".into()),
        Widget::Paragraph("Register New Certificate".into()),
        Widget::Field {
            label: "name",
            value: meta.name.clone(),
        },
        Widget::Field {
            label: "type",
            value: meta.certificate_type.clone(),
        },
        Widget::Field {
            label: "issuer",
            value: meta.issuer.clone(),
        },
        Widget::Field {
            label: "issued-to",
            value: meta.issued_to.clone(),
        },
        Widget::Field {
            label: "issue-date",
            value: meta.issue_date.clone(),
        },
        Widget::Field {
            label: "description",
            value: meta.description.clone(),
        },
        Widget::FileSlot {
            label: "certificate image",
            path: registration
                .file
                .as_ref()
                .map(|p| p.display().to_string()),
        },
    ];
    let controls = vec![
        Control::new(ControlId::Field(FormField::Name), "Certificate Name", "set name <value>"),
        Control::new(ControlId::Field(FormField::Type), "Certificate Type", "set type <value>"),
        Control::new(ControlId::Field(FormField::Issuer), "Issuer", "set issuer <value>"),
        Control::new(
            ControlId::Field(FormField::IssuedTo),
            "Issued To",
            "set issued-to <value>",
        ),
        Control::new(
            ControlId::Field(FormField::IssueDate),
            "Issue Date",
            "set issue-date <value>",
        ),
        Control::new(
            ControlId::Field(FormField::Description),
            "Description",
            "set description <value>",
        ),
        Control::new(ControlId::RegisterFile, "Certificate Image", "attach <path>"),
        Control::new(ControlId::RegisterSubmit, "Register Certificate", "register"),
        Control::new(ControlId::ViewAllButton, "View All Certificates", "list"),
    ];
    (body, controls)
}

fn verify_view(verify: &VerifyForm) -> (Vec<Widget>, Vec<Control>) {
    let body = vec![
        Widget::Heading("Verify Certificate".into()),
        Widget::Paragraph("Upload a certificate image to verify its authenticity.".into()),
        Widget::FileSlot {
            label: "certificate image",
            path: verify.file.as_ref().map(|p| p.display().to_string()),
        },
    ];
    let controls = vec![
        Control::new(ControlId::VerifyFile, "Certificate Image", "attach <path>"),
        Control::new(ControlId::VerifySubmit, "Verify Certificate", "verify"),
    ];
    (body, controls)
}

fn results_view(result: &crate::models::VerificationResult) -> (Vec<Widget>, Vec<Control>) {
    let mut body = vec![
        Widget::Heading("Verification Results".into()),
        Widget::ResultPanel {
            valid: result.is_valid,
            message: result.message.clone(),
        },
    ];
    if let Some(certificate) = &result.certificate {
        let meta = &certificate.metadata;
        body.push(Widget::Details(vec![
            ("ID", certificate.id.to_string()),
            ("Name", meta.name.clone()),
            ("Issued By", meta.issuer.clone()),
            ("Issued To", meta.issued_to.clone()),
            ("Issue Date", meta.issue_date.clone()),
            ("Type", meta.certificate_type.clone()),
            ("Description", meta.description.clone()),
        ]));
    }
    let controls = vec![Control::new(
        ControlId::BackToVerify,
        "Back to Verification",
        "back",
    )];
    (body, controls)
}

fn certificates_view(certificates: &[Certificate]) -> (Vec<Widget>, Vec<Control>) {
    let mut body = vec![Widget::Heading("All Certificates".into())];
    let mut controls = Vec::new();

    if certificates.is_empty() {
        body.push(Widget::Notice("No certificates found".into()));
    } else {
        for certificate in certificates {
            let meta = &certificate.metadata;
            body.push(Widget::CertificateRow {
                id: certificate.id.clone(),
                name: meta.name.clone(),
                issued_to: meta.issued_to.clone(),
                issuer: meta.issuer.clone(),
                issue_date: meta.issue_date.clone(),
            });
            controls.push(Control::new(
                ControlId::Revoke(certificate.id.clone()),
                "Revoke",
                "revoke <id>",
            ));
        }
    }

    controls.push(Control::new(
        ControlId::BackToAdmin,
        "Back to Admin Panel",
        "back",
    ));
    (body, controls)
}

/// Draw a tree as terminal text.
pub fn draw(tree: &UiTree) -> String {
    let mut out = String::new();

    if let Some(alert) = &tree.alert {
        out.push_str(&format!("[{}] {}\n\n", alert.kind.label(), alert.text));
    }

    if !tree.nav.is_empty() {
        let items: Vec<&str> = tree.nav.iter().map(|c| c.label).collect();
        out.push_str(&format!("== {} ==\n", items.join(" | ")));
    }

    for widget in &tree.body {
        match widget {
            Widget::Heading(text) => out.push_str(&format!("\n# {text}\n")),
            Widget::Paragraph(text) => out.push_str(&format!("{text}\n")),
            Widget::Field { label, value } => {
                let shown = if value.is_empty() { "<empty>" } else { value };
                out.push_str(&format!("  {label}: {shown}\n"));
            }
            Widget::FileSlot { label, path } => {
                let shown = path.as_deref().unwrap_or("<no file selected>");
                out.push_str(&format!("  {label}: {shown}\n"));
            }
            Widget::ResultPanel { valid, message } => {
                let verdict = if *valid {
                    "Certificate Verified"
                } else {
                    "Verification Failed"
                };
                out.push_str(&format!("  {verdict}: {message}\n"));
            }
            Widget::Details(pairs) => {
                for (label, value) in pairs {
                    out.push_str(&format!("    {label}: {value}\n"));
                }
            }
            Widget::CertificateRow {
                id,
                name,
                issued_to,
                issuer,
                issue_date,
            } => {
                out.push_str(&format!(
                    "  [{id}] {name} | to: {issued_to} | by: {issuer} | on: {issue_date}\n"
                ));
            }
            Widget::Notice(text) => out.push_str(&format!("  ({text})\n")),
        }
    }

    if !tree.controls.is_empty() {
        out.push_str("\nCommands: ");
        let mut usages: Vec<&str> = tree.controls.iter().map(|c| c.usage).collect();
        usages.dedup();
        out.push_str(&usages.join(", "));
        out.push('\n');
    }

    out
}
