#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! A logged-in session against an edX LMS.

use std::sync::Arc;

use anyhow::{Context, Result, anyhow, bail};
use reqwest::{
    StatusCode, Url,
    blocking::{Client, Response},
    cookie::{CookieStore, Jar},
    header::{ACCEPT, REFERER},
};
use serde_json::Value;
use tracing::debug;

use crate::{
    config::SiteConfig,
    encode::{EncodedField, form_pairs},
    error::CheckError,
    grader::{GraderClient, GraderReply},
};

/// Header carrying the anti-forgery token.
const CSRF_HEADER: &str = "X-CSRFToken";

/// Cookie holding the anti-forgery token.
const CSRF_COOKIE: &str = "csrftoken";

/// `Accept` value the xblock handlers expect from their own frontend.
const XBLOCK_ACCEPT: &str = "application/json, text/javascript, */*; q=0.01";

/// HTTP client plus the cookie jar that holds its login.
struct Session {
    /// Shared reqwest client bound to `jar`.
    http: Client,
    /// Cookies set by the LMS.
    jar:  Arc<Jar>,
    /// LMS base url without a trailing slash.
    base: String,
}

impl Session {
    /// Builds a client with its own cookie jar.
    fn new(base: &str, accept_invalid_certs: bool) -> Result<Self> {
        let jar = Arc::new(Jar::default());
        let http = Client::builder()
            .cookie_provider(Arc::clone(&jar))
            .danger_accept_invalid_certs(accept_invalid_certs)
            .build()
            .context("Failed to construct HTTP client")?;
        Ok(Self {
            http,
            jar,
            base: base.to_string(),
        })
    }

    /// Returns the current `csrftoken` cookie value, if one was set.
    fn csrf_token(&self) -> Option<String> {
        let url = Url::parse(&self.base).ok()?;
        let cookies = self.jar.cookies(&url)?;
        cookies
            .to_str()
            .ok()?
            .split(';')
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| *name == CSRF_COOKIE)
            .map(|(_, value)| value.to_string())
    }

    /// GETs `url`, returning the response.
    fn get(&self, url: &str) -> Result<Response> {
        self.http
            .get(url)
            .send()
            .with_context(|| format!("Failed to get {url}"))
    }
}

/// [`GraderClient`] backed by a staff login on an edX LMS.
pub struct EdxClient {
    /// The logged-in session.
    session:   Session,
    /// Course holding the problems under test.
    course_id: String,
    /// Staff user the session is logged in as.
    username:  String,
    /// Token used on handler and dashboard posts, fetched on first use.
    csrf:      Option<String>,
}

impl EdxClient {
    /// Logs in to the LMS described by `config`.
    pub fn connect(config: &SiteConfig) -> Result<Self> {
        let base = config.require_site_base_url()?;
        let username = config.require_username()?;
        let password = config.require_password()?;
        let course_id = config.require_course_id()?;

        let session = Session::new(base, config.accept_invalid_certs())?;
        let login_page = format!("{base}/login");
        session.get(&login_page)?;
        let csrf = session
            .csrf_token()
            .with_context(|| format!("No csrf token in login page {login_page}"))?;

        let resp = session
            .http
            .post(format!("{base}/user_api/v1/account/login_session/"))
            .header(CSRF_HEADER, &csrf)
            .header(REFERER, &login_page)
            .form(&[("email", username), ("password", password)])
            .send()
            .context("Failed to post login")?;
        if resp.status() != StatusCode::OK {
            let status = resp.status();
            let body = resp.text().unwrap_or_default();
            bail!("Login failed for {username} ({status}): {body}");
        }
        debug!(user = username, site = base, "logged in");

        Ok(Self {
            session,
            course_id: course_id.to_string(),
            username: username.to_string(),
            csrf: None,
        })
    }

    /// Usage key of a problem in this course.
    pub fn problem_block_id(&self, url_name: &str) -> String {
        let course = self
            .course_id
            .strip_prefix("course-v1:")
            .unwrap_or(&self.course_id);
        format!("block-v1:{course}+type@problem+block@{url_name}")
    }

    /// Base url of the problem's xmodule handler.
    pub fn problem_url(&self, url_name: &str) -> String {
        format!(
            "{}/courses/{}/xblock/{}/handler/xmodule_handler",
            self.session.base,
            self.course_id,
            self.problem_block_id(url_name)
        )
    }

    /// Learner-facing url that jumps to the problem.
    pub fn jump_to_url(&self, url_name: &str) -> String {
        format!("{}/courses/{}/jump_to_id/{url_name}", self.session.base, self.course_id)
    }

    /// The course's instructor dashboard.
    pub fn instructor_dashboard_url(&self) -> String {
        format!("{}/courses/{}/instructor", self.session.base, self.course_id)
    }

    /// Visits `page` and returns the csrf token it leaves behind, caching it.
    fn ensure_csrf(&mut self, page: &str) -> Result<String> {
        if let Some(csrf) = &self.csrf {
            return Ok(csrf.clone());
        }
        self.session.get(page)?;
        let csrf = self
            .session
            .csrf_token()
            .with_context(|| format!("No csrf token after visiting {page}"))?;
        debug!(page, "fetched csrf token");
        self.csrf = Some(csrf.clone());
        Ok(csrf)
    }

    /// Posts to an xblock handler and decodes its JSON reply.
    fn xblock_json(
        &mut self,
        handler: &str,
        url_name: &str,
        form: &[(String, String)],
    ) -> Result<Value> {
        let referer = self.jump_to_url(url_name);
        let csrf = self.ensure_csrf(&referer)?;
        let url = format!("{}/{handler}", self.problem_url(url_name));

        let resp = self
            .session
            .http
            .post(&url)
            .header(CSRF_HEADER, csrf)
            .header(ACCEPT, XBLOCK_ACCEPT)
            .header(REFERER, referer)
            .form(form)
            .send()
            .with_context(|| format!("Failed to post {url}"))?;
        let status = resp.status();
        let text = resp
            .text()
            .with_context(|| format!("Could not read reply from {url}"))?;
        serde_json::from_str(&text).with_context(|| {
            format!(
                "Handler {handler} for {url_name} did not reply with JSON, ret code={status}, \
                 text={text}"
            )
        })
    }

    /// Posts an instructor dashboard action, falling back to GET when the
    /// POST is refused.
    fn dashboard_action(&mut self, url: &str, data: &[(&str, &str)]) -> Result<Response> {
        let dashboard = self.instructor_dashboard_url();
        let csrf = self.ensure_csrf(&format!("{dashboard}#view-data_download"))?;

        let resp = self
            .session
            .http
            .post(url)
            .header(CSRF_HEADER, &csrf)
            .header(REFERER, url)
            .form(data)
            .send()
            .with_context(|| format!("Failed to post {url}"))?;
        if resp.status() == StatusCode::OK {
            return Ok(resp);
        }

        self.session
            .http
            .get(url)
            .query(data)
            .header(CSRF_HEADER, &csrf)
            .header(REFERER, url)
            .send()
            .with_context(|| format!("Failed to get {url}"))
    }
}

impl GraderClient for EdxClient {
    fn submit(
        &mut self,
        problem_id: &str,
        fields: &[EncodedField],
    ) -> Result<GraderReply, CheckError> {
        let form = form_pairs(fields);
        debug!(problem = problem_id, ?form, "problem_check");

        let data = self
            .xblock_json("problem_check", problem_id, &form)
            .map_err(CheckError::Transport)?;
        let overall_label = data
            .get("success")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                CheckError::Transport(anyhow!("problem_check reply has no `success`: {data}"))
            })?
            .to_string();
        let raw_markup = data
            .get("contents")
            .and_then(Value::as_str)
            .map(str::to_string);

        Ok(GraderReply {
            overall_label,
            raw_markup,
        })
    }

    fn reset_attempts(&mut self, problem_id: &str, username: &str) -> Result<bool, CheckError> {
        let url = format!("{}/api/reset_student_attempts", self.instructor_dashboard_url());
        let block_id = self.problem_block_id(problem_id);
        let data = [
            ("problem_to_reset", block_id.as_str()),
            ("unique_student_identifier", username),
            ("delete_module", "false"),
        ];

        let resp = self
            .dashboard_action(&url, &data)
            .map_err(CheckError::Transport)?;
        if resp.status() != StatusCode::OK {
            debug!(status = %resp.status(), %url, "reset refused");
            return Ok(false);
        }
        let reply: Value = match resp.json() {
            Ok(reply) => reply,
            Err(err) => {
                debug!(%url, "reset reply is not JSON: {err}");
                return Ok(false);
            }
        };
        Ok(reply.get("student").is_some())
    }

    fn username(&self) -> &str {
        &self.username
    }

    fn problem_location(&self, problem_id: &str) -> String {
        self.problem_url(problem_id)
    }
}
