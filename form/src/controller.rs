//! State and validation of the registration form.
//!
//! A [`FormController`] owns the text fields, the selected picture and its
//! preview, the per-field error messages and the transient UI flags. Invalid
//! input never reaches the network: [`FormController::submit`] refuses to
//! send until [`FormController::validate`] passes and a picture is held.
use std::sync::Arc;

use libregistration::domain::core::fields::{Field, Gender, ImageUpload, MIN_PASSWORD_LENGTH};

use crate::{
    browser::{Clipboard, PreviewHandle, PreviewStore},
    client::{RegistrationClient, RegistrationPayload, RegistrationReceipt},
    notify::Notifier,
};

/// Label shown while no picture is selected.
pub const DEFAULT_FILE_LABEL: &str = "select a picture";

pub const NO_IMAGE_SELECTED: &str = "no image selected";
pub const IMAGE_REQUIRED: &str = "image field is required";
pub const REGISTRATION_SUCCESSFUL: &str = "Registration successful!";

pub type SelectedFile = ImageUpload;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormData {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub gender: String,
}

impl FormData {
    /// Text value of a field, `None` for the picture.
    pub fn get(&self, field: Field) -> Option<&str> {
        match field {
            Field::FirstName => Some(&self.first_name),
            Field::LastName => Some(&self.last_name),
            Field::Email => Some(&self.email),
            Field::Password => Some(&self.password),
            Field::Gender => Some(&self.gender),
            Field::Image => None,
        }
    }

    fn get_mut(&mut self, field: Field) -> Option<&mut String> {
        match field {
            Field::FirstName => Some(&mut self.first_name),
            Field::LastName => Some(&mut self.last_name),
            Field::Email => Some(&mut self.email),
            Field::Password => Some(&mut self.password),
            Field::Gender => Some(&mut self.gender),
            Field::Image => None,
        }
    }
}

/// One optional message per form key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldErrors {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub gender: Option<String>,
    pub image: Option<String>,
}

impl FieldErrors {
    fn slot(&mut self, field: Field) -> &mut Option<String> {
        match field {
            Field::FirstName => &mut self.first_name,
            Field::LastName => &mut self.last_name,
            Field::Email => &mut self.email,
            Field::Password => &mut self.password,
            Field::Gender => &mut self.gender,
            Field::Image => &mut self.image,
        }
    }

    fn set(&mut self, field: Field, message: &str) {
        *self.slot(field) = Some(message.to_string());
    }

    pub fn get(&self, field: Field) -> Option<&str> {
        match field {
            Field::FirstName => self.first_name.as_deref(),
            Field::LastName => self.last_name.as_deref(),
            Field::Email => self.email.as_deref(),
            Field::Password => self.password.as_deref(),
            Field::Gender => self.gender.as_deref(),
            Field::Image => self.image.as_deref(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> {
        Field::ALL
            .into_iter()
            .filter_map(move |field| self.get(field).map(|message| (field, message)))
    }

    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Validation {
    pub is_valid: bool,
    pub errors: FieldErrors,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Client-side validation failed, nothing was sent.
    Invalid(FieldErrors),
    Registered(RegistrationReceipt),
    Failed(String),
}

// Clears the loading flag when the submission settles or is dropped.
struct Loading<'a>(&'a mut bool);

impl<'a> Loading<'a> {
    fn start(flag: &'a mut bool) -> Self {
        *flag = true;
        Self(flag)
    }
}

impl Drop for Loading<'_> {
    fn drop(&mut self) {
        *self.0 = false;
    }
}

fn field_errors(form: &FormData, file_error: Option<&str>) -> FieldErrors {
    let mut errors = FieldErrors::default();

    if form.first_name.is_empty() {
        errors.set(Field::FirstName, "first name is required");
    }
    if form.last_name.is_empty() {
        errors.set(Field::LastName, "last name is required");
    }

    if form.email.is_empty() {
        errors.set(Field::Email, "email is required");
    } else if !form.email.contains('@') {
        errors.set(Field::Email, "Invalid email");
    }

    if form.password.is_empty() {
        errors.set(Field::Password, "Password is required");
    } else if form.password.chars().count() < MIN_PASSWORD_LENGTH {
        errors.set(Field::Password, "Password too short");
    }

    if form.gender.is_empty() {
        errors.set(Field::Gender, "gender is required");
    } else if form.gender.parse::<Gender>().is_err() {
        errors.set(Field::Gender, "invalid gender");
    }

    if let Some(message) = file_error {
        errors.set(Field::Image, message);
    }

    errors
}

pub struct FormController<C, N> {
    client: C,
    notifier: N,
    previews: Arc<dyn PreviewStore + Send + Sync>,
    form: FormData,
    errors: FieldErrors,
    file_error: Option<String>,
    selected: Option<SelectedFile>,
    preview: Option<PreviewHandle>,
    file_label: String,
    loading: bool,
    link_copied: bool,
}

impl<C, N> FormController<C, N>
where
    C: RegistrationClient,
    N: Notifier,
{
    pub fn new(client: C, notifier: N, previews: Arc<dyn PreviewStore + Send + Sync>) -> Self {
        Self {
            client,
            notifier,
            previews,
            form: FormData::default(),
            errors: FieldErrors::default(),
            file_error: None,
            selected: None,
            preview: None,
            file_label: DEFAULT_FILE_LABEL.to_string(),
            loading: false,
            link_copied: false,
        }
    }

    pub fn form(&self) -> &FormData {
        &self.form
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn file_label(&self) -> &str {
        &self.file_label
    }

    pub fn selected_file(&self) -> Option<&SelectedFile> {
        self.selected.as_ref()
    }

    pub fn preview_url(&self) -> Option<&str> {
        self.preview.as_ref().map(PreviewHandle::url)
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn link_copied(&self) -> bool {
        self.link_copied
    }

    /// Updates a text field and re-runs validation. The picture is set
    /// through [`FormController::on_file_selected`].
    pub fn on_field_change(&mut self, field: Field, value: impl Into<String>) -> Validation {
        match self.form.get_mut(field) {
            Some(slot) => *slot = value.into(),
            None => tracing::debug!(%field, "Ignoring text value for a file field"),
        }
        self.validate()
    }

    /// Accepts or rejects a picture. A rejection releases the preview and
    /// forgets any previously accepted picture.
    pub fn on_file_selected(&mut self, file: Option<SelectedFile>) -> Validation {
        let file = match file {
            Some(file) => file,
            None => return self.reject_file(NO_IMAGE_SELECTED.to_string()),
        };
        if let Err(rejection) = file.check() {
            return self.reject_file(rejection.to_string());
        }

        self.preview.take();
        self.preview = Some(PreviewHandle::acquire(self.previews.clone(), &file));
        self.file_label = file.file_name.clone();
        self.selected = Some(file);
        self.file_error = None;
        self.validate()
    }

    fn reject_file(&mut self, message: String) -> Validation {
        tracing::debug!(%message, "Picture rejected");
        self.preview.take();
        self.selected = None;
        self.file_label = DEFAULT_FILE_LABEL.to_string();
        self.file_error = Some(message);
        self.validate()
    }

    pub fn validate(&mut self) -> Validation {
        self.errors = field_errors(&self.form, self.file_error.as_deref());
        Validation {
            is_valid: self.errors.is_empty(),
            errors: self.errors.clone(),
        }
    }

    fn payload(&self) -> RegistrationPayload {
        let fields = Field::ALL
            .into_iter()
            .filter_map(|field| {
                self.form
                    .get(field)
                    .filter(|value| !value.is_empty())
                    .map(|value| (field, value.to_string()))
            })
            .collect();
        RegistrationPayload {
            fields,
            image: self.selected.clone(),
        }
    }

    /// Validates and sends the form, then notifies the user of the outcome.
    ///
    /// The submission holds `&mut self` until it settles, so a second one
    /// can't start while `loading` is set.
    pub async fn submit(&mut self) -> SubmitOutcome {
        if self.selected.is_none() {
            self.file_error = Some(IMAGE_REQUIRED.to_string());
            return SubmitOutcome::Invalid(self.validate().errors);
        }

        let validation = self.validate();
        if !validation.is_valid {
            return SubmitOutcome::Invalid(validation.errors);
        }

        let payload = self.payload();
        let result = {
            let _loading = Loading::start(&mut self.loading);
            self.client.register(payload).await
        };

        match result {
            Ok(receipt) => {
                let message = receipt
                    .message
                    .as_deref()
                    .filter(|message| !message.is_empty())
                    .unwrap_or(REGISTRATION_SUCCESSFUL);
                self.notifier.success(message);
                SubmitOutcome::Registered(receipt)
            }
            Err(err) => {
                let message = err.to_string();
                self.notifier.failure(&message);
                SubmitOutcome::Failed(message)
            }
        }
    }

    /// Clears the form and releases the preview.
    pub fn reset(&mut self) {
        self.form = FormData::default();
        self.preview.take();
        self.selected = None;
        self.file_error = None;
        self.errors = FieldErrors::default();
        self.file_label = DEFAULT_FILE_LABEL.to_string();
        self.link_copied = false;
    }

    /// Empties the password without re-validating.
    pub fn clear_password(&mut self) {
        self.form.password.clear();
    }

    /// Copies the page link once, later calls are ignored until a reset.
    pub fn copy_link(&mut self, clipboard: &dyn Clipboard, url: &str) -> bool {
        if self.link_copied {
            return false;
        }
        match clipboard.write_text(url) {
            Ok(()) => {
                self.link_copied = true;
                true
            }
            Err(err) => {
                tracing::warn!(error = %err, "Couldn't copy link");
                false
            }
        }
    }
}

#[cfg(test)]
mod test {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::{
        browser::ObjectUrls,
        client::{SubmitError, REGISTRATION_FAILED},
    };

    use super::*;

    struct FakeClient {
        response: Result<RegistrationReceipt, SubmitError>,
        calls: Arc<Mutex<Vec<RegistrationPayload>>>,
        // Never answers when set.
        stalled: bool,
    }

    #[async_trait]
    impl RegistrationClient for FakeClient {
        async fn register(
            &self,
            payload: RegistrationPayload,
        ) -> Result<RegistrationReceipt, SubmitError> {
            self.calls.lock().expect("Should lock calls").push(payload);
            if self.stalled {
                std::future::pending::<()>().await;
            }
            self.response.clone()
        }
    }

    #[derive(Debug, PartialEq)]
    enum Notice {
        Success(String),
        Failure(String),
    }

    #[derive(Clone, Default)]
    struct RecordingNotifier(Arc<Mutex<Vec<Notice>>>);

    impl Notifier for RecordingNotifier {
        fn success(&self, message: &str) {
            self.0
                .lock()
                .expect("Should lock notices")
                .push(Notice::Success(message.to_string()));
        }

        fn failure(&self, message: &str) {
            self.0
                .lock()
                .expect("Should lock notices")
                .push(Notice::Failure(message.to_string()));
        }
    }

    struct FakeClipboard(Mutex<Vec<String>>);

    impl Clipboard for FakeClipboard {
        fn write_text(&self, text: &str) -> Result<(), String> {
            self.0.lock().map_err(|err| err.to_string())?.push(text.to_string());
            Ok(())
        }
    }

    struct Harness {
        controller: FormController<FakeClient, RecordingNotifier>,
        urls: Arc<ObjectUrls>,
        calls: Arc<Mutex<Vec<RegistrationPayload>>>,
        notices: Arc<Mutex<Vec<Notice>>>,
    }

    fn harness(response: Result<RegistrationReceipt, SubmitError>) -> Harness {
        let urls = Arc::new(ObjectUrls::new());
        let calls = Arc::new(Mutex::new(Vec::new()));
        let notifier = RecordingNotifier::default();
        let notices = notifier.0.clone();
        let controller = FormController::new(
            FakeClient {
                response,
                calls: calls.clone(),
                stalled: false,
            },
            notifier,
            urls.clone(),
        );
        Harness {
            controller,
            urls,
            calls,
            notices,
        }
    }

    fn inserted() -> Result<RegistrationReceipt, SubmitError> {
        Ok(RegistrationReceipt {
            success: true,
            id: Some("1234".to_string()),
            message: Some("data is inserted successfully".to_string()),
        })
    }

    fn jpeg(size: usize) -> SelectedFile {
        SelectedFile {
            file_name: "ada.jpg".to_string(),
            content_type: "image/jpeg".to_string(),
            bytes: vec![0xff; size],
        }
    }

    fn fill_in_ada(controller: &mut FormController<FakeClient, RecordingNotifier>) {
        controller.on_field_change(Field::FirstName, "Ada");
        controller.on_field_change(Field::LastName, "Lovelace");
        controller.on_field_change(Field::Email, "ada@example.com");
        controller.on_field_change(Field::Password, "secret1");
        controller.on_field_change(Field::Gender, "female");
    }

    #[test]
    fn it_reports_every_missing_field() {
        let mut h = harness(inserted());
        let validation = h.controller.validate();
        assert!(!validation.is_valid);
        assert_eq!(
            validation.errors.first_name.as_deref(),
            Some("first name is required")
        );
        assert_eq!(
            validation.errors.last_name.as_deref(),
            Some("last name is required")
        );
        assert_eq!(validation.errors.email.as_deref(), Some("email is required"));
        assert_eq!(
            validation.errors.password.as_deref(),
            Some("Password is required")
        );
        assert_eq!(validation.errors.gender.as_deref(), Some("gender is required"));
        assert_eq!(validation.errors.image, None);
    }

    #[test]
    fn it_revalidates_on_every_change() {
        let mut h = harness(inserted());

        let validation = h.controller.on_field_change(Field::Email, "ada.example.com");
        assert_eq!(validation.errors.email.as_deref(), Some("Invalid email"));

        let validation = h.controller.on_field_change(Field::Password, "abc");
        assert_eq!(validation.errors.password.as_deref(), Some("Password too short"));

        let validation = h.controller.on_field_change(Field::Gender, "robot");
        assert_eq!(validation.errors.gender.as_deref(), Some("invalid gender"));

        fill_in_ada(&mut h.controller);
        assert!(h.controller.validate().is_valid);
        assert!(h.controller.errors().is_empty());
        assert_eq!(h.controller.form().first_name, "Ada");
    }

    #[test]
    fn it_accepts_and_replaces_pictures() {
        let mut h = harness(inserted());

        h.controller.on_file_selected(Some(jpeg(100 * 1024)));
        let first = h
            .controller
            .preview_url()
            .expect("Should hold a preview")
            .to_string();
        assert_eq!(h.controller.file_label(), "ada.jpg");
        assert!(h.urls.is_live(&first));

        let mut png = jpeg(10);
        png.file_name = "ada.png".to_string();
        png.content_type = "image/png".to_string();
        h.controller.on_file_selected(Some(png));
        assert!(!h.urls.is_live(&first));
        assert_eq!(h.urls.live(), 1);
        assert_eq!(h.controller.file_label(), "ada.png");
    }

    #[test]
    fn it_rejects_pictures_outside_the_policy() {
        let mut h = harness(inserted());

        let mut gif = jpeg(10);
        gif.content_type = "image/gif".to_string();
        let cases = [
            (Some(gif), "invalid image type"),
            (Some(jpeg(2 * 1024 * 1024 + 1)), "Image must be smaller than 2MB"),
            (None, NO_IMAGE_SELECTED),
        ];

        for (file, message) in cases {
            h.controller.on_file_selected(Some(jpeg(1024)));
            assert!(h.controller.selected_file().is_some());

            let validation = h.controller.on_file_selected(file);
            assert_eq!(validation.errors.image.as_deref(), Some(message));
            assert!(h.controller.selected_file().is_none());
            assert!(h.controller.preview_url().is_none());
            assert_eq!(h.controller.file_label(), DEFAULT_FILE_LABEL);
            assert_eq!(h.urls.live(), 0);
        }
    }

    #[tokio::test]
    async fn it_submits_a_valid_form() {
        let mut h = harness(inserted());
        fill_in_ada(&mut h.controller);
        h.controller.on_file_selected(Some(jpeg(100 * 1024)));

        let outcome = h.controller.submit().await;
        assert!(matches!(outcome, SubmitOutcome::Registered(ref receipt) if receipt.id.as_deref() == Some("1234")));
        assert!(!h.controller.is_loading());

        let calls = h.calls.lock().expect("Should lock calls");
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].get(Field::FirstName), Some("Ada"));
        assert_eq!(calls[0].get(Field::Gender), Some("female"));
        assert_eq!(calls[0].image, Some(jpeg(100 * 1024)));

        assert_eq!(
            *h.notices.lock().expect("Should lock notices"),
            vec![Notice::Success("data is inserted successfully".to_string())]
        );
    }

    #[tokio::test]
    async fn it_refuses_to_submit_without_a_picture() {
        let mut h = harness(inserted());
        fill_in_ada(&mut h.controller);

        let outcome = h.controller.submit().await;
        assert!(
            matches!(outcome, SubmitOutcome::Invalid(ref errors) if errors.image.as_deref() == Some(IMAGE_REQUIRED))
        );
        assert!(h.calls.lock().expect("Should lock calls").is_empty());
        assert!(h.notices.lock().expect("Should lock notices").is_empty());
    }

    #[tokio::test]
    async fn it_refuses_to_submit_an_invalid_form() {
        let mut h = harness(inserted());
        fill_in_ada(&mut h.controller);
        h.controller.on_field_change(Field::Password, "abc");
        h.controller.on_file_selected(Some(jpeg(1024)));

        let outcome = h.controller.submit().await;
        assert!(
            matches!(outcome, SubmitOutcome::Invalid(ref errors) if errors.password.as_deref() == Some("Password too short"))
        );
        assert!(h.calls.lock().expect("Should lock calls").is_empty());
    }

    #[tokio::test]
    async fn it_surfaces_server_rejections() {
        let mut h = harness(Err(SubmitError::Rejected(REGISTRATION_FAILED.to_string())));
        fill_in_ada(&mut h.controller);
        h.controller.on_file_selected(Some(jpeg(1024)));

        let outcome = h.controller.submit().await;
        assert_eq!(outcome, SubmitOutcome::Failed(REGISTRATION_FAILED.to_string()));
        assert!(!h.controller.is_loading());
        assert_eq!(
            *h.notices.lock().expect("Should lock notices"),
            vec![Notice::Failure(REGISTRATION_FAILED.to_string())]
        );
    }

    #[tokio::test]
    async fn it_falls_back_to_a_default_success_message() {
        let mut h = harness(Ok(RegistrationReceipt {
            success: true,
            id: Some("1234".to_string()),
            message: None,
        }));
        fill_in_ada(&mut h.controller);
        h.controller.on_file_selected(Some(jpeg(1024)));

        h.controller.submit().await;
        assert_eq!(
            *h.notices.lock().expect("Should lock notices"),
            vec![Notice::Success(REGISTRATION_SUCCESSFUL.to_string())]
        );
    }

    #[test]
    fn reset_clears_everything() {
        let mut h = harness(inserted());
        fill_in_ada(&mut h.controller);
        h.controller.on_file_selected(Some(jpeg(1024)));
        let clipboard = FakeClipboard(Mutex::new(Vec::new()));
        assert!(h.controller.copy_link(&clipboard, "http://localhost:3000/"));
        assert_eq!(h.urls.live(), 1);

        h.controller.reset();
        assert_eq!(h.controller.form(), &FormData::default());
        assert_eq!(h.controller.errors(), &FieldErrors::default());
        assert!(h.controller.selected_file().is_none());
        assert!(h.controller.preview_url().is_none());
        assert_eq!(h.controller.file_label(), DEFAULT_FILE_LABEL);
        assert!(!h.controller.link_copied());
        assert_eq!(h.urls.live(), 0);
    }

    #[test]
    fn dropping_the_controller_releases_the_preview() {
        let h = harness(inserted());
        let Harness {
            mut controller,
            urls,
            ..
        } = h;
        controller.on_file_selected(Some(jpeg(1024)));
        assert_eq!(urls.live(), 1);

        drop(controller);
        assert_eq!(urls.live(), 0);
    }

    #[test]
    fn the_link_is_copied_once() {
        let mut h = harness(inserted());
        let clipboard = FakeClipboard(Mutex::new(Vec::new()));

        assert!(h.controller.copy_link(&clipboard, "http://localhost:3000/"));
        assert!(!h.controller.copy_link(&clipboard, "http://localhost:3000/"));
        assert!(h.controller.link_copied());
        assert_eq!(
            *clipboard.0.lock().expect("Should lock clipboard"),
            vec!["http://localhost:3000/".to_string()]
        );
    }

    #[test]
    fn clearing_the_password_keeps_the_errors() {
        let mut h = harness(inserted());
        fill_in_ada(&mut h.controller);
        assert!(h.controller.errors().is_empty());

        h.controller.clear_password();
        assert_eq!(h.controller.form().password, "");
        assert_eq!(h.controller.form().first_name, "Ada");
        assert!(h.controller.errors().is_empty());

        let validation = h.controller.validate();
        assert_eq!(
            validation.errors.password.as_deref(),
            Some("Password is required")
        );
    }

    #[tokio::test]
    async fn dropping_a_pending_submission_clears_loading() {
        let mut h = harness(inserted());
        h.controller.client.stalled = true;
        fill_in_ada(&mut h.controller);
        h.controller.on_file_selected(Some(jpeg(1024)));

        let pending = tokio::time::timeout(
            std::time::Duration::from_millis(20),
            h.controller.submit(),
        )
        .await;
        assert!(pending.is_err());
        assert_eq!(h.calls.lock().expect("Should lock calls").len(), 1);

        assert!(!h.controller.is_loading());
        assert!(h.notices.lock().expect("Should lock notices").is_empty());

        h.controller.client.stalled = false;
        assert!(matches!(
            h.controller.submit().await,
            SubmitOutcome::Registered(_)
        ));
        assert!(!h.controller.is_loading());
    }
}
