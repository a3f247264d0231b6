use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use tracing::{debug, error, instrument};

use crate::{auth::extractors::SessionUser, catalog::Service, state::AppState};

pub fn page_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home))
        .route("/auth/login", get(login_page))
        .route("/auth/register", get(register_page))
        .route("/dashboard", get(dashboard))
        .route("/dashboard/services", get(services))
        .route("/health", get(|| async { "ok" }))
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

fn layout(title: &str, body: &str) -> Html<String> {
    Html(format!(
        r#"<!doctype html>
<html lang="es">
<head><meta charset="utf-8"><title>{}</title></head>
<body>
{}
</body>
</html>"#,
        escape(title),
        body
    ))
}

// Submits a form as JSON to an action endpoint and follows up on success.
const ACTION_SCRIPT: &str = r#"<script>
document.querySelectorAll("form[data-action]").forEach(function (form) {
  form.addEventListener("submit", async function (ev) {
    ev.preventDefault();
    var body = Object.fromEntries(new FormData(form).entries());
    var res = await fetch(form.dataset.action, {
      method: "POST",
      headers: { "Content-Type": "application/json" },
      body: JSON.stringify(body)
    });
    var data = await res.json();
    if (res.ok) { window.location.href = form.dataset.next; return; }
    var msg = data.issues ? data.issues.map(function (i) { return i.message; }).join(" ") : data.message;
    form.querySelector(".error").textContent = msg;
  });
});
</script>"#;

async fn home() -> Html<String> {
    layout(
        "Inicio",
        r#"<h1>Bienvenido</h1>
<p><a href="/auth/login">Iniciar sesión</a> · <a href="/auth/register">Crear cuenta</a> · <a href="/dashboard">Dashboard</a></p>"#,
    )
}

async fn login_page() -> Html<String> {
    let body = format!(
        r#"<h1>Iniciar sesión</h1>
<form data-action="/_actions/login" data-next="/dashboard">
  <label>Email <input type="email" name="email" required></label>
  <label>Contraseña <input type="password" name="password" required></label>
  <button type="submit">Entrar</button>
  <p class="error"></p>
</form>
<p><a href="/auth/register">Crear cuenta</a></p>
{ACTION_SCRIPT}"#
    );
    layout("Iniciar sesión", &body)
}

async fn register_page() -> Html<String> {
    let body = format!(
        r#"<h1>Crear cuenta</h1>
<form data-action="/_actions/register" data-next="/dashboard">
  <label>Nombre <input type="text" name="name" required></label>
  <label>Email <input type="email" name="email" required></label>
  <label>Contraseña <input type="password" name="password" required></label>
  <label>Confirmar contraseña <input type="password" name="confirmPassword" required></label>
  <button type="submit">Registrarse</button>
  <p class="error"></p>
</form>
<p><a href="/auth/login">Ya tengo cuenta</a></p>
{ACTION_SCRIPT}"#
    );
    layout("Crear cuenta", &body)
}

#[instrument(skip_all)]
async fn dashboard(SessionUser(user): SessionUser) -> Html<String> {
    let body = format!(
        r#"<h1>Hola, {}</h1>
<p>{}</p>
<p><a href="/dashboard/services">Servicios</a></p>
<form data-action="/_actions/logout" data-next="/auth/login">
  <button type="submit">Cerrar sesión</button>
  <p class="error"></p>
</form>
{ACTION_SCRIPT}"#,
        escape(&user.name),
        escape(&user.email),
    );
    layout("Dashboard", &body)
}

fn services_table(services: &[Service]) -> String {
    if services.is_empty() {
        return "<p>No hay servicios registrados.</p>".to_string();
    }
    let rows: String = services
        .iter()
        .map(|s| {
            format!(
                "<tr><td>{}</td><td>{}</td><td>{:.2}</td></tr>\n",
                escape(&s.title),
                escape(&s.description),
                s.price
            )
        })
        .collect();
    format!(
        "<table>\n<tr><th>Servicio</th><th>Descripción</th><th>Precio</th></tr>\n{rows}</table>"
    )
}

#[instrument(skip_all)]
async fn services(State(state): State<AppState>, SessionUser(user): SessionUser) -> Response {
    match state.services.list().await {
        Ok(list) => {
            debug!(user_id = user.id, count = list.len(), "services listed");
            let body = format!(
                "<h1>Servicios</h1>\n{}\n<p><a href=\"/dashboard\">Volver</a></p>",
                services_table(&list)
            );
            layout("Servicios", &body).into_response()
        }
        Err(e) => {
            error!(error = %e, "list services failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "Error interno del servidor").into_response()
        }
    }
}

pub async fn not_found() -> (StatusCode, Html<String>) {
    (
        StatusCode::NOT_FOUND,
        layout("No encontrado", "<h1>Página no encontrada</h1>"),
    )
}
