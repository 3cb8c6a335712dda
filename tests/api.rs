mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};
use common::{
    Multipart, body_bytes, body_json, body_text, spawn_app, spawn_pooled_app, wav_fixture,
};
use futures::future::join_all;
use serde_json::json;

#[tokio::test]
async fn health_and_readiness() {
    let app = spawn_app().await;
    assert_eq!(app.get("/healthz").await.status(), StatusCode::OK);

    let resp = app.get("/readyz").await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["checks"]["catalog"]["ok"], true);
    assert_eq!(body["checks"]["blobs"]["ok"], true);
}

#[tokio::test]
async fn upload_records_song_with_duration_and_urls() {
    let app = spawn_app().await;
    let song = app.upload_song("first.wav", "First", "rock").await;

    assert_eq!(song["fileName"], "first.wav");
    assert_eq!(song["time"], "0:01");
    assert_eq!(song["playCount"], 0);
    assert_eq!(song["songUrl"], "http://localhost:3000/objects/musicapp/first.wav");
    assert!(
        song["photoUrl"]
            .as_str()
            .unwrap()
            .starts_with("http://localhost:3000/objects/imagesmusicapp/")
    );
    assert_eq!(app.blobs.puts(), 2);

    let id = song["id"].as_str().unwrap();
    let fetched = body_json(app.get(&format!("/songs/{}", id)).await).await;
    assert_eq!(fetched["title"], song["title"]);
    assert_eq!(fetched["songUrl"], song["songUrl"]);

    let by_genre = body_json(app.get("/songs/genre/rock").await).await;
    assert_eq!(by_genre, json!([id]));
}

#[tokio::test]
async fn duplicate_title_is_taken_and_writes_no_blobs() {
    let app = spawn_app().await;
    app.upload_song("a.wav", "Same Title", "pop").await;
    let puts_before = app.blobs.puts();

    let form = Multipart::new()
        .text("title", "Same Title")
        .text("artist", "Other")
        .text("genre", "pop")
        .file("file", "b.wav", "audio/wav", wav_fixture(1))
        .file("photo", "cover.jpg", "image/jpeg", b"jpeg".to_vec());
    let resp = app.multipart("/songs", form).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await["error"], "taken");
    assert_eq!(app.blobs.puts(), puts_before);
}

#[tokio::test]
async fn duplicate_file_name_is_taken() {
    let app = spawn_app().await;
    app.upload_song("same.wav", "One", "pop").await;
    let puts_before = app.blobs.puts();

    let form = Multipart::new()
        .text("title", "Two")
        .file("file", "same.wav", "audio/wav", wav_fixture(1));
    let resp = app.multipart("/songs", form).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(app.blobs.puts(), puts_before);
}

#[tokio::test]
async fn undecodable_audio_fails_without_record() {
    let app = spawn_app().await;
    let form = Multipart::new()
        .text("title", "Broken")
        .file("file", "broken.mp3", "audio/mpeg", b"this is not audio".to_vec());
    let resp = app.multipart("/songs", form).await;

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(resp).await["error"], "Failed to read song duration");
    assert_eq!(app.blobs.puts(), 0);
    assert_eq!(body_json(app.get("/songs").await).await, json!([]));
}

#[tokio::test]
async fn stream_serves_whole_file_and_ranges() {
    let app = spawn_app().await;
    app.upload_song("track.wav", "Track", "jazz").await;
    let full = wav_fixture(1);
    let len = full.len();

    let resp = app.get("/songs/stream/track.wav").await;
    assert_eq!(resp.status(), StatusCode::OK);
    let headers = resp.headers().clone();
    assert_eq!(headers[header::ACCEPT_RANGES], "bytes");
    assert_eq!(headers[header::CONTENT_LENGTH], len.to_string().as_str());
    assert_eq!(
        headers[header::CONTENT_DISPOSITION],
        "inline; filename=\"track.wav\""
    );
    assert_eq!(body_bytes(resp).await.as_ref(), full.as_slice());

    let ranged = |range: &'static str| {
        Request::get("/songs/stream/track.wav")
            .header(header::RANGE, range)
            .body(Body::empty())
            .unwrap()
    };

    let resp = app.send(ranged("bytes=10-109")).await;
    assert_eq!(resp.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(
        resp.headers()[header::CONTENT_RANGE],
        format!("bytes 10-109/{}", len).as_str()
    );
    assert_eq!(body_bytes(resp).await.as_ref(), &full[10..110]);

    let resp = app.send(ranged("bytes=100-")).await;
    assert_eq!(resp.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(body_bytes(resp).await.len(), len - 100);

    // Only the first range of a multi-range request is served.
    let resp = app.send(ranged("bytes=0-3, 20-30")).await;
    assert_eq!(resp.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(body_bytes(resp).await.as_ref(), &full[0..4]);
}

#[tokio::test]
async fn stream_rejects_bad_ranges_and_missing_objects() {
    let app = spawn_app().await;
    app.upload_song("track.wav", "Track", "jazz").await;
    let len = wav_fixture(1).len();

    let out_of_bounds = Request::get("/songs/stream/track.wav")
        .header(header::RANGE, format!("bytes={}-", len))
        .body(Body::empty())
        .unwrap();
    let resp = app.send(out_of_bounds).await;
    assert_eq!(resp.status(), StatusCode::RANGE_NOT_SATISFIABLE);
    assert_eq!(
        resp.headers()[header::CONTENT_RANGE],
        format!("bytes */{}", len).as_str()
    );

    let malformed = Request::get("/songs/stream/track.wav")
        .header(header::RANGE, "bytes=abc")
        .body(Body::empty())
        .unwrap();
    assert_eq!(app.send(malformed).await.status(), StatusCode::BAD_REQUEST);

    assert_eq!(
        app.get("/songs/stream/missing.wav").await.status(),
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        app.get("/songs/stream/..%2Fsecret").await.status(),
        StatusCode::BAD_REQUEST
    );
}

#[tokio::test]
async fn public_urls_resolve_through_object_routes() {
    let app = spawn_app().await;
    let song = app.upload_song("public.wav", "Public", "rock").await;

    let path = song["songUrl"]
        .as_str()
        .unwrap()
        .trim_start_matches("http://localhost:3000")
        .to_string();
    let resp = app.get(&path).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_bytes(resp).await.as_ref(), wav_fixture(1).as_slice());

    let head = app.request("HEAD", &path).await;
    assert_eq!(head.status(), StatusCode::OK);
    assert_eq!(
        head.headers()[header::CONTENT_LENGTH],
        wav_fixture(1).len().to_string().as_str()
    );

    let keys = body_json(app.get("/objects/musicapp").await).await;
    assert_eq!(keys, json!(["public.wav"]));
}

#[tokio::test]
async fn stream_names_non_ascii_files() {
    let app = spawn_app().await;
    let form = Multipart::new()
        .text("title", "Café")
        .text("fileName", "Café.wav")
        .file("file", "upload.wav", "audio/wav", wav_fixture(1));
    assert_eq!(app.multipart("/songs", form).await.status(), StatusCode::CREATED);

    let resp = app.get("/songs/stream/Caf%C3%A9.wav").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers()[header::CONTENT_DISPOSITION],
        "inline; filename=\"Caf_.wav\"; filename*=UTF-8''Caf%C3%A9.wav"
    );
}

#[tokio::test]
async fn song_edits_and_play_counts() {
    let app = spawn_app().await;
    let song = app.upload_song("edit.wav", "Before", "pop").await;
    let other = app.upload_song("other.wav", "Taken", "pop").await;
    let id = song["id"].as_str().unwrap();

    let resp = app
        .json("PUT", &format!("/songs/{}", id), json!({ "title": "After" }))
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let edited = body_json(resp).await;
    assert_eq!(edited["title"], "After");
    assert_eq!(edited["artist"], "Test Artist");

    let clash = app
        .json("PUT", &format!("/songs/{}", id), json!({ "title": other["title"] }))
        .await;
    assert_eq!(clash.status(), StatusCode::BAD_REQUEST);

    for _ in 0..2 {
        let resp = app
            .request("PUT", &format!("/songs/{}/incrementPlayCount", id))
            .await;
        assert_eq!(resp.status(), StatusCode::OK);
    }
    let fetched = body_json(app.get(&format!("/songs/{}", id)).await).await;
    assert_eq!(fetched["playCount"], 2);

    assert_eq!(
        app.request("PUT", "/songs/missing/incrementPlayCount")
            .await
            .status(),
        StatusCode::NOT_FOUND
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_follows_and_unfollows_net_to_zero() {
    const FANS: usize = 40;
    let app = spawn_pooled_app().await;
    let owner = app.login("owner").await;
    let playlist = app.empty_playlist(&owner, "Shared").await;

    let mut users = Vec::new();
    for i in 0..FANS {
        users.push(app.login(&format!("fan{}", i)).await);
    }

    let follows: Vec<_> = users
        .iter()
        .map(|user| {
            app.spawn_request(
                "POST",
                &format!("/users/{}/addPlaylistToUser?playlistId={}", user, playlist),
            )
        })
        .collect();
    for resp in join_all(follows).await {
        assert_eq!(resp.unwrap().status(), StatusCode::OK);
    }
    let followers = body_json(app.get(&format!("/playlists/{}/followers", playlist)).await).await;
    assert_eq!(followers, json!(FANS));

    // Repeating a follow does not count twice.
    app.request(
        "POST",
        &format!("/users/{}/addPlaylistToUser?playlistId={}", users[0], playlist),
    )
    .await;

    let unfollows: Vec<_> = users
        .iter()
        .map(|user| {
            app.spawn_request(
                "DELETE",
                &format!("/users/{}/deletePlayListFromUser?playlistId={}", user, playlist),
            )
        })
        .collect();
    for resp in join_all(unfollows).await {
        assert_eq!(resp.unwrap().status(), StatusCode::OK);
    }
    let followers = body_json(app.get(&format!("/playlists/{}/followers", playlist)).await).await;
    assert_eq!(followers, json!(0));
}

#[tokio::test]
async fn unfollow_without_follow_keeps_counter_at_zero() {
    let app = spawn_app().await;
    let user = app.login("lonely").await;
    let playlist = app.empty_playlist(&user, "Nobody").await;

    let resp = app
        .request(
            "DELETE",
            &format!("/users/{}/deletePlayListFromUser?playlistId={}", user, playlist),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let followers = body_json(app.get(&format!("/playlists/{}/followers", playlist)).await).await;
    assert_eq!(followers, json!(0));

    let missing = app
        .request(
            "POST",
            &format!("/users/{}/addPlaylistToUser?playlistId=nope", user),
        )
        .await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn adding_a_song_twice_reports_already_added() {
    let app = spawn_app().await;
    let user = app.login("curator").await;
    let playlist = app.empty_playlist(&user, "Mine").await;
    let song = app.upload_song("s.wav", "S", "rock").await;
    let uri = format!(
        "/playlists/{}/addSongToPlayList?songId={}",
        playlist,
        song["id"].as_str().unwrap()
    );

    let first = app.request("POST", &uri).await;
    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(body_text(first).await, "Song added to playlist successfully.");

    let second = app.request("POST", &uri).await;
    assert_eq!(second.status(), StatusCode::OK);
    assert_eq!(body_text(second).await, "Already Added");

    let stored = body_json(app.get(&format!("/playlists/{}", playlist)).await).await;
    assert_eq!(stored["songs"], json!([song["id"]]));
    assert_eq!(stored["photoUrl"], song["photoUrl"]);

    let missing = app
        .request(
            "POST",
            &format!("/playlists/{}/addSongToPlayList?songId=nope", playlist),
        )
        .await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn multipart_playlist_creation_and_owner_delete() {
    let app = spawn_app().await;
    let owner = app.login("owner").await;
    let stranger = app.login("stranger").await;
    let a = app.upload_song("a.wav", "A", "rock").await;
    let b = app.upload_song("b.wav", "B", "rock").await;

    let form = Multipart::new()
        .text("name", "Road Trip")
        .text("songs", a["id"].as_str().unwrap())
        .text("songs", b["id"].as_str().unwrap())
        .text("songs", a["id"].as_str().unwrap());
    let resp = app
        .multipart(&format!("/playlists?userId={}", owner), form)
        .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let playlist = body_json(resp).await;
    assert_eq!(playlist["songs"], json!([a["id"], b["id"]]));
    assert_eq!(playlist["follows"], 0);
    assert_eq!(playlist["photoUrl"], a["photoUrl"]);
    let id = playlist["id"].as_str().unwrap();

    for song in [&a, &b] {
        app.request(
            "PUT",
            &format!("/songs/{}/incrementPlayCount", song["id"].as_str().unwrap()),
        )
        .await;
    }
    let views = body_json(app.get(&format!("/playlists/{}/views", id)).await).await;
    assert_eq!(views, json!(2));

    let forbidden = app
        .request("DELETE", &format!("/playlists/{}?userId={}", id, stranger))
        .await;
    assert_eq!(forbidden.status(), StatusCode::FORBIDDEN);

    let deleted = app
        .request("DELETE", &format!("/playlists/{}?userId={}", id, owner))
        .await;
    assert_eq!(deleted.status(), StatusCode::OK);
    assert_eq!(
        app.get(&format!("/playlists/{}", id)).await.status(),
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn most_followed_curation_ranks_top_five_stably() {
    let app = spawn_app().await;
    let owner = app.login("owner").await;
    let mut fans = Vec::new();
    for i in 0..10 {
        fans.push(app.login(&format!("fan{}", i)).await);
    }

    let mut ids = Vec::new();
    for (name, follows) in [("P1", 10), ("P2", 7), ("P3", 7), ("P4", 3), ("P5", 1), ("P6", 0)] {
        let id = app.empty_playlist(&owner, name).await;
        for fan in fans.iter().take(follows) {
            let resp = app
                .request(
                    "POST",
                    &format!("/users/{}/addPlaylistToUser?playlistId={}", fan, id),
                )
                .await;
            assert_eq!(resp.status(), StatusCode::OK);
        }
        ids.push(id);
    }

    let mut runs = Vec::new();
    for _ in 0..2 {
        let resp = app.request("PUT", "/globalPlayLists/updateMostFollowed").await;
        assert_eq!(resp.status(), StatusCode::OK);
        let curated = body_json(app.get("/globalPlayLists/mostFollowed/playlists").await).await;
        let order: Vec<String> = curated
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["id"].as_str().unwrap().to_string())
            .collect();
        runs.push(order);
    }

    assert_eq!(runs[0], ids[..5].to_vec());
    assert_eq!(runs[0], runs[1]);
}

#[tokio::test]
async fn genre_mixed_curation_rebuilds_assigned_playlists() {
    let app = spawn_app().await;
    let owner = app.login("owner").await;
    let rock1 = app.upload_song("r1.wav", "R1", "rock").await;
    app.upload_song("j1.wav", "J1", "jazz").await;
    let rock2 = app.upload_song("r2.wav", "R2", "rock").await;
    let mix = app.empty_playlist(&owner, "rock").await;

    let assign = app
        .json("PUT", "/globalPlayLists/genreMixed/playlists", json!([mix]))
        .await;
    assert_eq!(assign.status(), StatusCode::OK);
    let computed_only = app
        .json("PUT", "/globalPlayLists/mostFollowed/playlists", json!([mix]))
        .await;
    assert_eq!(computed_only.status(), StatusCode::BAD_REQUEST);

    let resp = app.request("PUT", "/globalPlayLists/updateGenreMixed").await;
    assert_eq!(resp.status(), StatusCode::OK);

    let stored = body_json(app.get(&format!("/playlists/{}", mix)).await).await;
    assert_eq!(stored["songs"], json!([rock1["id"], rock2["id"]]));

    let slots = body_json(app.get("/globalPlayLists").await).await;
    assert_eq!(slots.as_array().unwrap().len(), 2);
    assert_eq!(
        app.get("/globalPlayLists/unknown/playlists").await.status(),
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn likes_and_user_views() {
    let app = spawn_app().await;
    let user = app.login("ann").await;
    let again = app.login("ann").await;
    assert_eq!(user, again);

    let song = app.upload_song("liked.wav", "Liked", "pop").await;
    let song_id = song["id"].as_str().unwrap();

    let like = app
        .request("POST", &format!("/users/{}/addToLiked?songId={}", user, song_id))
        .await;
    assert_eq!(like.status(), StatusCode::OK);
    let liked = body_json(app.get(&format!("/users/{}/likedSongs", user)).await).await;
    assert_eq!(liked[0]["id"], song_id);

    let unlike = app
        .request("DELETE", &format!("/users/{}/deleteLiked?songId={}", user, song_id))
        .await;
    assert_eq!(unlike.status(), StatusCode::OK);
    let profile = body_json(app.get(&format!("/users/{}", user)).await).await;
    assert_eq!(profile["likedSongs"], json!([]));

    assert_eq!(
        app.get("/users/missing").await.status(),
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn images_and_podcasts() {
    let app = spawn_app().await;
    let form = Multipart::new()
        .text("name", "banner")
        .file("file", "banner.png", "image/png", b"png-bytes".to_vec());
    let resp = app.multipart("/images", form).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let image = body_json(resp).await;
    assert_eq!(image["name"], "banner");

    let path = image["url"]
        .as_str()
        .unwrap()
        .trim_start_matches("http://localhost:3000")
        .to_string();
    assert_eq!(body_bytes(app.get(&path).await).await.as_ref(), b"png-bytes");

    let id = image["id"].as_str().unwrap();
    assert_eq!(
        app.request("DELETE", &format!("/images/{}", id)).await.status(),
        StatusCode::NO_CONTENT
    );
    assert_eq!(
        app.get(&format!("/images/{}", id)).await.status(),
        StatusCode::NOT_FOUND
    );

    let created = app
        .json(
            "POST",
            "/globalPodcasts",
            json!({ "title": "Weekly", "playLists": ["a", "b"] }),
        )
        .await;
    assert_eq!(created.status(), StatusCode::CREATED);
    let listed = body_json(app.get("/globalPodcasts").await).await;
    assert_eq!(listed[0]["title"], "Weekly");
    assert_eq!(listed[0]["playLists"], json!(["a", "b"]));
}
