//! Client operations against a simulated station

use std::time::Duration;

use chargelink_client::{
    ClientConfig, Delimiter, ExchangeError, ReleaseFormat, StationClient, StatusCode,
};
use chargelink_core::{Codec, FixedSigner, SimulatedStation, StationBehavior};

const SIGNATURE: &str = "signature123";
const LOCALHOST: &str = "127.0.0.1";

fn client(config: ClientConfig) -> StationClient {
    StationClient::new(config)
        .unwrap()
        .with_signer(FixedSigner::new(SIGNATURE))
}

fn default_client() -> StationClient {
    client(ClientConfig::new("1234567890123456").with_timeout(Duration::from_millis(1000)))
}

async fn station(behavior: StationBehavior) -> SimulatedStation {
    station_with(Delimiter::Space, behavior).await
}

async fn station_with(delimiter: Delimiter, behavior: StationBehavior) -> SimulatedStation {
    SimulatedStation::bind(Codec::default(), delimiter, behavior)
        .await
        .unwrap()
}

#[tokio::test]
async fn test_send_message_resolves_on_ok() {
    let station = station(StationBehavior::echo("OK")).await;

    let reply = default_client()
        .send_message("CMD1", station.port(), LOCALHOST)
        .await
        .unwrap();

    assert_eq!(reply.raw, "CMD1 signature123 OK");
}

#[tokio::test]
async fn test_server_errors_are_named() {
    for (status, message) in [
        ("SAF", "Invalid Safety Key"),
        ("NOA", "Useless operation"),
        ("ERR", "Unknown error"),
        ("BAD", "Unknown server error returned"),
    ] {
        let station = station(StationBehavior::echo(status)).await;

        let err = default_client()
            .send_message("CMD", station.port(), LOCALHOST)
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), message);
        assert_eq!(err.status(), Some(&StatusCode::parse(status)));
    }
}

#[tokio::test]
async fn test_retries_five_times() {
    let station = station(StationBehavior::Silent).await;
    let client = client(
        ClientConfig::new("1234567890123456")
            .with_timeout(Duration::from_millis(100))
            .with_retry_count(5),
    );

    let err = client
        .send_message("whateva", station.port(), LOCALHOST)
        .await
        .unwrap_err();

    assert_eq!(station.received_count(), 6);
    assert!(err.to_string().contains("API did not respond"));
}

#[tokio::test]
async fn test_update_db_command() {
    let station = station(StationBehavior::echo("OK")).await;

    let reply = default_client()
        .update_db("uid", 1, station.port(), LOCALHOST)
        .await
        .unwrap();

    assert_eq!(station.received(), vec![format!("UPDATEDB uid 1 {}", SIGNATURE)]);
    assert_eq!(reply.raw, format!("UPDATEDB {} OK", SIGNATURE));
}

#[tokio::test]
async fn test_reservation_command() {
    let station = station(StationBehavior::echo("OK")).await;

    let reply = default_client()
        .reserve("uid", 60, 1, station.port(), LOCALHOST)
        .await
        .unwrap();

    assert_eq!(station.received(), vec![format!("FIX_UID_ uid 60 1 {}", SIGNATURE)]);
    assert_eq!(reply.raw, format!("FIX_UID_ {} OK", SIGNATURE));
}

#[tokio::test]
async fn test_stop_reservation_differs_from_reservation() {
    let station = station(StationBehavior::echo("OK")).await;
    let client = default_client();

    client
        .reserve("uid", 90, 1, station.port(), LOCALHOST)
        .await
        .unwrap();
    let reply = client
        .stop_reservation("uid", 90, 1, station.port(), LOCALHOST)
        .await
        .unwrap();

    let received = station.received();
    assert_eq!(received[1], format!("FIX_UID_ uid 0 1 {}", SIGNATURE));
    assert_ne!(received[0], received[1]);
    assert_eq!(reply.raw, format!("FIX_UID_ {} OK", SIGNATURE));
}

#[tokio::test]
async fn test_legacy_stop_reservation_format() {
    let station = station(StationBehavior::echo("OK")).await;
    let client = client(
        ClientConfig::new("1234567890123456").with_release_format(ReleaseFormat::Legacy),
    );

    client
        .stop_reservation("uid", 90, 1, station.port(), LOCALHOST)
        .await
        .unwrap();

    assert_eq!(station.received(), vec![format!("FIX_UID_ uid 90 1 {}", SIGNATURE)]);
}

#[tokio::test]
async fn test_start_and_stop_charging_commands() {
    let station = station(StationBehavior::echo("OK")).await;
    let client = default_client();

    let started = client
        .start_charging("id", station.port(), LOCALHOST)
        .await
        .unwrap();
    let stopped = client
        .stop_charging("id", station.port(), LOCALHOST)
        .await
        .unwrap();

    assert_eq!(
        station.received(),
        vec![
            format!("START_ID_id {}", SIGNATURE),
            format!("STOP_ID_id {}", SIGNATURE),
        ]
    );
    assert_eq!(started.raw, format!("START_ID_id {} OK", SIGNATURE));
    assert_eq!(stopped.raw, format!("STOP_ID_id {} OK", SIGNATURE));
}

#[tokio::test]
async fn test_noa_on_stop_with_underscore_firmware() {
    // A space-splitting station sees the whole underscore request as its command
    let station = station(StationBehavior::reply(|request, _| format!("{}_NOA", request))).await;

    let strict = client(ClientConfig::new("k").with_delimiter(Delimiter::Underscore));
    let lenient = client(
        ClientConfig::new("k")
            .with_delimiter(Delimiter::Underscore)
            .with_noa_suppressed_for_stop(true),
    );

    let err = strict
        .stop_charging("42", station.port(), LOCALHOST)
        .await
        .unwrap_err();
    assert!(matches!(err, ExchangeError::Server(StatusCode::Noa)));

    let reply = lenient
        .stop_charging("42", station.port(), LOCALHOST)
        .await
        .unwrap();
    assert_eq!(reply.command, "STOP");
    assert_eq!(reply.entity_id.as_deref(), Some("42"));
    assert_eq!(reply.status, StatusCode::Noa);

    // Start commands still fail on NOA
    assert!(lenient
        .start_charging("42", station.port(), LOCALHOST)
        .await
        .is_err());

    assert_eq!(
        station.received()[0],
        format!("STOP_ID_42_{}", SIGNATURE)
    );
}

#[tokio::test]
async fn test_underscore_station_echo() {
    let station = station_with(Delimiter::Underscore, StationBehavior::echo("OK")).await;
    let client = client(ClientConfig::new("k").with_delimiter(Delimiter::Underscore));

    let reply = client
        .stop_charging("42", station.port(), LOCALHOST)
        .await
        .unwrap();

    assert_eq!(station.received(), vec![format!("STOP_ID_42_{}", SIGNATURE)]);
    assert_eq!(reply.raw, format!("STOP_{}_OK", SIGNATURE));
    assert_eq!(reply.command, "STOP");
    assert_eq!(reply.signature.as_deref(), Some(SIGNATURE));
    assert_eq!(reply.status, StatusCode::Ok);
}

#[tokio::test]
async fn test_concurrent_exchanges() {
    let station = station(StationBehavior::echo("OK")).await;
    let client = default_client();
    let port = station.port();

    let mut handles = Vec::new();
    for i in 0..8 {
        let client = client.clone();
        handles.push(tokio::spawn(async move {
            client
                .start_charging(&format!("ev{}", i), port, LOCALHOST)
                .await
        }));
    }

    for (i, handle) in handles.into_iter().enumerate() {
        let reply = handle.await.unwrap().unwrap();
        assert_eq!(reply.command, format!("START_ID_ev{}", i));
    }
    assert_eq!(station.received_count(), 8);
}
