//! End-to-end checks against a real PostgreSQL database.
//!
//! Set `TEST_DATABASE_URL` to run them; without it every test returns early.
//! Each test works on its own users and a unique city, so they can share one
//! database and run concurrently.

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use tower::ServiceExt;

use real_estate_listings_backend::api::{self, AppState};
use real_estate_listings_backend::auth::TokenKeys;
use real_estate_listings_backend::db::{Database, StoreError};
use real_estate_listings_backend::models::{new_id, NewCurrencyRate, NewWave, NewWavePermission};
use real_estate_listings_backend::repo;

fn test_state() -> Option<AppState> {
    match std::env::var("TEST_DATABASE_URL") {
        Ok(url) => Some(AppState {
            db: Database::new(url, 4),
            tokens: TokenKeys::new("integration-secret", Duration::hours(1)),
        }),
        Err(_) => {
            eprintln!("TEST_DATABASE_URL is not set; skipping store integration test");
            None
        }
    }
}

fn unique(prefix: &str) -> String {
    format!("{prefix}-{}", &new_id()[..8])
}

async fn call(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => request
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => request.body(Body::empty()),
    }
    .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

/// NUMERIC columns serialize as decimal strings with their column scale.
fn decimal(value: &Value) -> f64 {
    value.as_str().unwrap().parse().unwrap()
}

/// Registers a fresh user and returns `(token, user id)`.
async fn register(app: &Router) -> (String, String) {
    let name = unique("user");
    let (status, body) = call(
        app,
        Method::POST,
        "/api/register",
        None,
        Some(json!({
            "username": name,
            "email": format!("{name}@example.com"),
            "password": "correct horse",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    (
        body["token"].as_str().unwrap().to_owned(),
        body["user"]["id"].as_str().unwrap().to_owned(),
    )
}

async fn create_listing(app: &Router, token: &str, listing: Value) -> Value {
    let (status, body) = call(app, Method::POST, "/api/properties", Some(token), Some(listing)).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body
}

fn villa(city: &str, price: u32) -> Value {
    json!({
        "title": "Sea View Villa",
        "type": "villa",
        "listingType": "sale",
        "price": price,
        "bedrooms": 4,
        "bathrooms": 3,
        "address": "1 Shore Road",
        "city": city,
        "country": "Iraq",
    })
}

fn listing(city: &str, title: &str, description: &str, address: &str) -> Value {
    let mut listing = villa(city, 250_000);
    listing["title"] = json!(title);
    listing["description"] = json!(description);
    listing["address"] = json!(address);
    listing
}

fn ids(rows: &Value) -> Vec<String> {
    rows.as_array()
        .unwrap()
        .iter()
        .map(|row| row["id"].as_str().unwrap().to_owned())
        .collect()
}

#[tokio::test]
async fn register_login_and_duplicates() {
    let Some(state) = test_state() else { return };
    let app = api::router(state.clone());
    let name = unique("ana");
    let email = format!("{name}@example.com");
    let registration = json!({"username": name, "email": email, "password": "s3cret!"});

    let (status, body) = call(&app, Method::POST, "/api/register", None, Some(registration.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(body["user"].get("password").is_none());
    assert_eq!(body["user"]["role"], "user");
    let user_id = body["user"]["id"].as_str().unwrap().to_owned();
    let token = body["token"].as_str().unwrap();
    assert_eq!(state.tokens.resolve(token).as_deref(), Some(user_id.as_str()));

    let (status, _) = call(&app, Method::POST, "/api/register", None, Some(registration)).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/login",
        None,
        Some(json!({"email": email, "password": "s3cret!"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let token = body["token"].as_str().unwrap().to_owned();

    let (status, wrong_password) = call(
        &app,
        Method::POST,
        "/api/login",
        None,
        Some(json!({"email": email, "password": "guess"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, unknown_email) = call(
        &app,
        Method::POST,
        "/api/login",
        None,
        Some(json!({"email": format!("nobody-{email}"), "password": "guess"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_password, unknown_email);

    let (status, body) = call(&app, Method::GET, "/api/user", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], user_id.as_str());
}

#[tokio::test]
async fn listing_filters_only_active_villas_in_range() {
    let Some(state) = test_state() else { return };
    let app = api::router(state);
    let (token, _) = register(&app).await;
    let city = unique("erbil");

    let active = create_listing(&app, &token, villa(&city, 450_000)).await;
    let sold = create_listing(&app, &token, villa(&city, 460_000)).await;
    let (status, _) = call(
        &app,
        Method::PUT,
        &format!("/api/properties/{}", sold["id"].as_str().unwrap()),
        Some(&token),
        Some(json!({"status": "sold"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let uri = format!(
        "/api/properties?type=villa&minPrice=100000&maxPrice=500000&sortBy=price&order=desc&city={city}"
    );
    let (status, body) = call(&app, Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
    let properties = body["properties"].as_array().unwrap();
    assert_eq!(properties.len(), 1);
    assert_eq!(properties[0]["id"], active["id"]);
    assert!(properties[0]["agent"]["username"].is_string());
    assert_eq!(
        body["pagination"],
        json!({"currentPage": 1, "totalPages": 1, "totalCount": 1, "hasMore": false})
    );
}

#[tokio::test]
async fn pagination_counts_ignore_the_page_size() {
    let Some(state) = test_state() else { return };
    let app = api::router(state);
    let (token, _) = register(&app).await;
    let city = unique("duhok");
    for price in [100_000, 200_000, 300_000] {
        create_listing(&app, &token, villa(&city, price)).await;
    }

    let uri = format!("/api/properties?city={city}&limit=2&sortBy=price&order=asc");
    let (_, first) = call(&app, Method::GET, &uri, None, None).await;
    assert_eq!(first["properties"].as_array().unwrap().len(), 2);
    assert_eq!(
        first["pagination"],
        json!({"currentPage": 1, "totalPages": 2, "totalCount": 3, "hasMore": true})
    );

    let (_, second) = call(&app, Method::GET, &format!("{uri}&page=2"), None, None).await;
    let rows = second["properties"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(decimal(&rows[0]["price"]), 300_000.0);
    assert_eq!(second["pagination"]["hasMore"], false);
}

#[tokio::test]
async fn filtered_search_is_recorded_for_signed_in_users() {
    let Some(state) = test_state() else { return };
    let app = api::router(state);
    let (token, _) = register(&app).await;
    let city = unique("basra");
    create_listing(&app, &token, villa(&city, 250_000)).await;

    let uri = format!("/api/properties?city={city}&bedrooms=2");
    let (status, _) = call(&app, Method::GET, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    call(&app, Method::GET, "/api/properties", Some(&token), None).await;

    let (status, body) = call(&app, Method::GET, "/api/search-history", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let entries = body.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["filters"]["city"], city.as_str());
    assert_eq!(entries[0]["filters"]["bedrooms"], 2);
    assert_eq!(entries[0]["resultsCount"], 1);
}

#[tokio::test]
async fn concurrent_views_are_all_counted() {
    let Some(state) = test_state() else { return };
    let app = api::router(state);
    let (token, _) = register(&app).await;
    let listing = create_listing(&app, &token, villa(&unique("sulaymaniyah"), 300_000)).await;
    let slug = listing["slug"].as_str().unwrap().to_owned();
    let id = listing["id"].as_str().unwrap().to_owned();

    let viewers: Vec<_> = (0..8)
        .map(|_| {
            let app = app.clone();
            let uri = format!("/api/properties/{slug}");
            tokio::spawn(async move { call(&app, Method::GET, &uri, None, None).await.0 })
        })
        .collect();
    for viewer in viewers {
        assert_eq!(viewer.await.unwrap(), StatusCode::OK);
    }

    let (status, body) = call(&app, Method::GET, &format!("/api/properties/{id}"), None, None).await;
    assert_eq!(status, StatusCode::OK);
    // The response shows the count before this very view.
    assert_eq!(body["views"], 8);

    let (status, _) = call(&app, Method::GET, "/api/properties/no-such-listing", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn only_the_owner_may_update_a_listing() {
    let Some(state) = test_state() else { return };
    let app = api::router(state);
    let (owner, _) = register(&app).await;
    let (stranger, _) = register(&app).await;
    let listing = create_listing(&app, &owner, villa(&unique("kirkuk"), 150_000)).await;
    let uri = format!("/api/properties/{}", listing["id"].as_str().unwrap());

    let (status, _) = call(&app, Method::PUT, &uri, Some(&stranger), Some(json!({"price": 1}))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = call(&app, Method::PUT, &uri, Some(&owner), Some(json!({"title": "Renovated Villa"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Renovated Villa");
    assert_ne!(body["updatedAt"], listing["updatedAt"]);

    let (status, _) = call(&app, Method::PUT, "/api/properties/missing", Some(&owner), Some(json!({}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn favorites_round_trip_and_award_points() {
    let Some(state) = test_state() else { return };
    let app = api::router(state);
    let (token, _) = register(&app).await;
    let listing = create_listing(&app, &token, villa(&unique("najaf"), 120_000)).await;
    let property_id = listing["id"].as_str().unwrap().to_owned();
    let favorite = json!({"propertyId": property_id});

    let (status, _) = call(&app, Method::POST, "/api/favorites", Some(&token), Some(favorite.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = call(&app, Method::POST, "/api/favorites", Some(&token), Some(favorite)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    let (status, _) = call(
        &app,
        Method::POST,
        "/api/favorites",
        Some(&token),
        Some(json!({"propertyId": "missing"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, favorites) = call(&app, Method::GET, "/api/favorites", Some(&token), None).await;
    let ids: Vec<_> = favorites.as_array().unwrap().iter().map(|p| p["id"].clone()).collect();
    assert_eq!(ids, vec![json!(property_id)]);

    let (_, points) = call(&app, Method::GET, "/api/user/points", Some(&token), None).await;
    assert_eq!(points["totalPoints"], 5);
    assert_eq!(points["lifetimePoints"], 5);
    assert_eq!(points["level"], "bronze");

    let uri = format!("/api/favorites/{property_id}");
    let (status, body) = call(&app, Method::DELETE, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);
    let (status, _) = call(&app, Method::DELETE, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, favorites) = call(&app, Method::GET, "/api/favorites", Some(&token), None).await;
    assert_eq!(favorites, json!([]));
}

#[tokio::test]
async fn inquiries_default_to_pending_and_award_points() {
    let Some(state) = test_state() else { return };
    let app = api::router(state);
    let (token, user_id) = register(&app).await;
    let listing = create_listing(&app, &token, villa(&unique("karbala"), 180_000)).await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/inquiries",
        Some(&token),
        Some(json!({"propertyId": listing["id"], "name": "Ana"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["required"], json!(["email", "message"]));

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/inquiries",
        Some(&token),
        Some(json!({
            "propertyId": listing["id"],
            "name": "Ana",
            "email": "ana@example.com",
            "message": "Is the villa still available?",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "pending");
    assert_eq!(body["userId"], user_id.as_str());
    assert!(body["phone"].is_null());

    let (_, points) = call(&app, Method::GET, "/api/user/points", Some(&token), None).await;
    assert_eq!(points["lifetimePoints"], 10);
}

#[tokio::test]
async fn wave_capacity_is_enforced() {
    let Some(state) = test_state() else { return };
    let app = api::router(state.clone());
    let (token, user_id) = register(&app).await;
    let (outsider, _) = register(&app).await;
    let wave_id = new_id();
    let seeded_wave = wave_id.clone();
    state
        .db
        .run(move |conn| {
            repo::waves::create(
                conn,
                &NewWave {
                    id: &seeded_wave,
                    name: "Spring launch",
                    description: None,
                    max_properties: 1,
                    is_active: true,
                    created_by: None,
                },
            )?;
            let permission_id = new_id();
            repo::waves::grant_permission(
                conn,
                &NewWavePermission {
                    id: &permission_id,
                    user_id: &user_id,
                    wave_id: &seeded_wave,
                    granted_by: None,
                    expires_at: Some(Utc::now() + Duration::days(1)),
                    is_active: true,
                },
            )?;
            Ok::<_, StoreError>(())
        })
        .await
        .unwrap();

    let mut listing = villa(&unique("mosul"), 200_000);
    listing["waveId"] = json!(wave_id);
    let (status, _) = call(&app, Method::POST, "/api/properties", Some(&outsider), Some(listing.clone())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let created = create_listing(&app, &token, listing.clone()).await;
    assert_eq!(created["waveId"], wave_id.as_str());
    let (status, _) = call(&app, Method::POST, "/api/properties", Some(&token), Some(listing)).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, waves) = call(&app, Method::GET, "/api/waves", None, None).await;
    let wave = waves
        .as_array()
        .unwrap()
        .iter()
        .find(|w| w["id"] == wave_id.as_str())
        .unwrap()
        .clone();
    assert_eq!(wave["propertyCount"], 1);
    assert_eq!(wave["remaining"], 0);
}

#[tokio::test]
async fn conversion_uses_latest_rate_or_its_inverse() {
    let Some(state) = test_state() else { return };
    let app = api::router(state.clone());
    // Made-up codes keep this test independent of other rows.
    let base = unique("B").to_uppercase();
    let quote = unique("Q").to_uppercase();
    let (from, to) = (base.clone(), quote.clone());
    state
        .db
        .run(move |conn| {
            for (rate, days_ago) in [("1400", 3), ("1500", 1)] {
                let id = new_id();
                repo::currency::create(
                    conn,
                    &NewCurrencyRate {
                        id: &id,
                        from_currency: &from,
                        to_currency: &to,
                        rate: rate.parse().unwrap(),
                        set_by: None,
                        effective_date: Utc::now() - Duration::days(days_ago),
                        is_active: true,
                    },
                )?;
            }
            Ok::<_, StoreError>(())
        })
        .await
        .unwrap();

    let uri = format!("/api/currency-rates/convert?from={base}&to={quote}&amount=2");
    let (status, body) = call(&app, Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(decimal(&body["rate"]), 1500.0);
    assert_eq!(decimal(&body["converted"]), 3000.0);

    let uri = format!("/api/currency-rates/convert?from={quote}&to={base}&amount=3000");
    let (status, body) = call(&app, Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!((decimal(&body["converted"]) - 2.0).abs() < 1e-3);

    let uri = format!("/api/currency-rates/convert?from={base}&to=ZZZ&amount=1");
    let (status, _) = call(&app, Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn featured_shows_the_six_newest_active_featured_listings() {
    let Some(state) = test_state() else { return };
    let app = api::router(state);
    let (token, _) = register(&app).await;
    let city = unique("zakho");

    let mut featured = Vec::new();
    for price in 1..=7 {
        let mut listing = villa(&city, price * 100_000);
        listing["isFeatured"] = json!(true);
        featured.push(create_listing(&app, &token, listing).await["id"].as_str().unwrap().to_owned());
    }
    let plain = create_listing(&app, &token, villa(&city, 900_000)).await;
    let newest = featured.pop().unwrap();
    let (status, _) = call(
        &app,
        Method::PUT,
        &format!("/api/properties/{newest}"),
        Some(&token),
        Some(json!({"status": "sold"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = call(&app, Method::GET, "/api/properties/featured", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let shown = ids(&body);
    featured.reverse();
    assert_eq!(shown, featured);
    assert!(!shown.contains(&newest));
    assert!(!shown.iter().any(|id| plain["id"] == id.as_str()));
    for row in body.as_array().unwrap() {
        assert_eq!(row["isFeatured"], true);
        assert_eq!(row["status"], "active");
    }
}

#[tokio::test]
async fn rate_list_shows_active_rates_newest_first() {
    let Some(state) = test_state() else { return };
    let app = api::router(state.clone());
    let base = unique("L").to_uppercase();
    let seeded = base.clone();
    state
        .db
        .run(move |conn| {
            for (quote, days_ago, is_active) in [("OLD", 5, true), ("NEW", 1, true), ("OFF", 0, false)] {
                let id = new_id();
                repo::currency::create(
                    conn,
                    &NewCurrencyRate {
                        id: &id,
                        from_currency: &seeded,
                        to_currency: quote,
                        rate: "1.25".parse().unwrap(),
                        set_by: None,
                        effective_date: Utc::now() - Duration::days(days_ago),
                        is_active,
                    },
                )?;
            }
            Ok::<_, StoreError>(())
        })
        .await
        .unwrap();

    let (status, body) = call(&app, Method::GET, "/api/currency-rates", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let rows = body.as_array().unwrap();
    let ours: Vec<_> = rows
        .iter()
        .filter(|row| row["fromCurrency"] == base.as_str())
        .map(|row| row["toCurrency"].as_str().unwrap())
        .collect();
    assert_eq!(ours, vec!["NEW", "OLD"]);
    assert!(rows.iter().all(|row| row["isActive"] == true));

    let dates: Vec<chrono::DateTime<Utc>> = rows
        .iter()
        .map(|row| row["effectiveDate"].as_str().unwrap().parse().unwrap())
        .collect();
    assert!(dates.windows(2).all(|pair| pair[0] >= pair[1]));
}

#[tokio::test]
async fn free_text_search_spans_title_description_and_address() {
    let Some(state) = test_state() else { return };
    let app = api::router(state);
    let (token, _) = register(&app).await;
    let city = unique("halabja");

    let garden = create_listing(
        &app,
        &token,
        listing(&city, "Family Home", "Quiet GARDEN with 100% natural light", "3 Hill Street"),
    )
    .await;
    let harbour = create_listing(
        &app,
        &token,
        listing(&city, "Corner Flat", "1000 square meters", "7 Harbour_Lane"),
    )
    .await;
    let lakeside = create_listing(
        &app,
        &token,
        listing(&city, "Lakeside Cabin", "Wooden cabin", "9 HarbourXLane"),
    )
    .await;

    let search = |term: &str| format!("/api/properties?city={city}&search={term}");
    let found = |body: &Value| ids(&body["properties"]);

    // Only the description mentions a garden.
    let (status, body) = call(&app, Method::GET, &search("garden"), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(found(&body), vec![garden["id"].as_str().unwrap().to_owned()]);

    let (_, body) = call(&app, Method::GET, &search("LAKESIDE"), None, None).await;
    assert_eq!(found(&body), vec![lakeside["id"].as_str().unwrap().to_owned()]);

    let (_, body) = call(&app, Method::GET, &search("harbour"), None, None).await;
    assert_eq!(body["pagination"]["totalCount"], 2);

    // Wildcards in the term match literally.
    let (_, body) = call(&app, Method::GET, &search("100%25"), None, None).await;
    assert_eq!(found(&body), vec![garden["id"].as_str().unwrap().to_owned()]);
    let (_, body) = call(&app, Method::GET, &search("r_L"), None, None).await;
    assert_eq!(found(&body), vec![harbour["id"].as_str().unwrap().to_owned()]);
}
