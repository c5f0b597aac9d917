use recipe_share_api::routes::params::Pagination;
use recipe_share_api::storage;

const APP_URL: &str = "http://localhost:3000";

#[test]
fn thumbnail_url_prefixes_stored_paths() {
    let url = storage::thumbnail_url(APP_URL, Some("recipes/thumbnails/abc.jpg"));
    assert_eq!(
        url.as_deref(),
        Some("http://localhost:3000/storage/recipes/thumbnails/abc.jpg")
    );
}

#[test]
fn thumbnail_url_passes_absolute_urls_through() {
    let url = storage::thumbnail_url(APP_URL, Some("https://cdn.example.com/x.jpg"));
    assert_eq!(url.as_deref(), Some("https://cdn.example.com/x.jpg"));
    assert_eq!(storage::thumbnail_url(APP_URL, None), None);
}

#[test]
fn thumbnail_url_tolerates_trailing_slash_and_leading_slash() {
    let url = storage::thumbnail_url("http://localhost:3000/", Some("/a/b.jpg"));
    assert_eq!(url.as_deref(), Some("http://localhost:3000/storage/a/b.jpg"));
}

#[test]
fn ingredient_image_url_falls_back_to_placeholder() {
    assert_eq!(
        storage::ingredient_image_url(APP_URL, None),
        "http://localhost:3000/images/placeholders/ingredient-placeholder.jpg"
    );
    assert_eq!(
        storage::ingredient_image_url(APP_URL, Some("")),
        "http://localhost:3000/images/placeholders/ingredient-placeholder.jpg"
    );
    assert_eq!(
        storage::ingredient_image_url(APP_URL, Some("carrot.jpg")),
        "http://localhost:3000/images/ingredients/carrot.jpg"
    );
    assert_eq!(
        storage::ingredient_image_url(APP_URL, Some("https://cdn.example.com/carrot.jpg")),
        "https://cdn.example.com/carrot.jpg"
    );
}

#[test]
fn profile_picture_url_defaults_when_unset() {
    assert_eq!(
        storage::profile_picture_url(APP_URL, None),
        "http://localhost:3000/images/default_profile.jpg"
    );
    assert_eq!(
        storage::profile_picture_url(APP_URL, Some("profiles/me.png")),
        "http://localhost:3000/storage/profiles/me.png"
    );
}

#[test]
fn pagination_normalizes_defaults_and_bounds() {
    let (page, per_page, offset) = Pagination {
        page: None,
        per_page: None,
    }
    .normalize();
    assert_eq!((page, per_page, offset), (1, 10, 0));

    let (page, per_page, offset) = Pagination {
        page: Some(3),
        per_page: Some(25),
    }
    .normalize();
    assert_eq!((page, per_page, offset), (3, 25, 50));

    // Out-of-range values are clamped rather than rejected.
    let (page, per_page, offset) = Pagination {
        page: Some(0),
        per_page: Some(1000),
    }
    .normalize();
    assert_eq!((page, per_page, offset), (1, 100, 0));
}
