use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use ureq::{Agent, AgentBuilder};

use crate::coords::Coordinate;

pub const YANDEX_GEOCODER_URL: &str = "https://geocode-maps.yandex.ru/1.x";

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Geocoded {
    Found(Coordinate),
    NotFound,
}

pub struct Geocoder {
    agent: Agent,
    api_key: String,
    base_url: String,
}

impl Geocoder {
    pub fn new(api_key: String) -> Self {
        Self {
            agent: AgentBuilder::new()
                .user_agent(concat!("coffee-map/", env!("CARGO_PKG_VERSION")))
                .build(),
            api_key,
            base_url: YANDEX_GEOCODER_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Resolves `address` to the most relevant match.
    ///
    /// An empty result set is [`Geocoded::NotFound`]; transport failures,
    /// non-2xx statuses and unexpected payloads are errors.
    pub fn locate(&self, address: &str) -> Result<Geocoded> {
        log::debug!("Geocoding {address:?} via {}", self.base_url);
        let response: GeocoderResponse = self
            .agent
            .get(&self.base_url)
            .query("geocode", address)
            .query("apikey", &self.api_key)
            .query("format", "json")
            .call()
            .map_err(request_error)?
            .into_json()
            .context("failed to parse geocoder response")?;

        response.most_relevant()
    }
}

// ureq's own messages carry the full url, api key included
fn request_error(err: ureq::Error) -> anyhow::Error {
    match err {
        ureq::Error::Status(code, _) => anyhow!("geocoder responded with status code {code}"),
        ureq::Error::Transport(x) => match x.message() {
            Some(message) => anyhow!("geocoder request failed: {}: {message}", x.kind()),
            None => anyhow!("geocoder request failed: {}", x.kind()),
        },
    }
}

#[derive(Deserialize)]
pub struct GeocoderResponse {
    response: ResponseBody,
}

#[derive(Deserialize)]
struct ResponseBody {
    #[serde(rename = "GeoObjectCollection")]
    collection: GeoObjectCollection,
}

#[derive(Deserialize)]
struct GeoObjectCollection {
    #[serde(rename = "featureMember")]
    members: Vec<FeatureMember>,
}

#[derive(Deserialize)]
struct FeatureMember {
    #[serde(rename = "GeoObject")]
    object: GeoObject,
}

#[derive(Deserialize)]
struct GeoObject {
    #[serde(rename = "Point")]
    point: RawPoint,
}

#[derive(Deserialize)]
struct RawPoint {
    pos: String,
}

impl GeocoderResponse {
    pub fn most_relevant(&self) -> Result<Geocoded> {
        match self.response.collection.members.first() {
            Some(x) => Ok(Geocoded::Found(x.object.point.refine()?)),
            None => Ok(Geocoded::NotFound),
        }
    }
}

impl RawPoint {
    // "<lon> <lat>"
    fn refine(&self) -> Result<Coordinate> {
        let (lon, lat) = self
            .pos
            .trim()
            .split_once(' ')
            .with_context(|| format!("malformed position: {:?}", self.pos))?;
        let lon: f64 = lon
            .trim()
            .parse()
            .with_context(|| format!("malformed longitude: {lon:?}"))?;
        let lat: f64 = lat
            .trim()
            .parse()
            .with_context(|| format!("malformed latitude: {lat:?}"))?;
        Ok(Coordinate::new(lat, lon))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::{
        io::{BufRead, BufReader, Write},
        net::TcpListener,
        thread::{self, JoinHandle},
    };

    use serde_json::json;

    use super::*;

    /// Answers a single HTTP request with `status` and `body`.
    ///
    /// Returns the url to query and a handle yielding the request line.
    pub fn serve(status: &str, body: &str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/1.x", listener.local_addr().unwrap());
        let reply = format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut request_line = String::new();
            reader.read_line(&mut request_line).unwrap();
            loop {
                let mut header = String::new();
                if reader.read_line(&mut header).unwrap() == 0 || header == "\r\n" {
                    break;
                }
            }
            stream.write_all(reply.as_bytes()).unwrap();
            stream.flush().unwrap();
            request_line
        });
        (url, handle)
    }

    pub fn feature_collection(positions: &[&str]) -> String {
        let members: Vec<_> = positions
            .iter()
            .map(|pos| json!({ "GeoObject": { "Point": { "pos": pos } } }))
            .collect();
        json!({ "response": { "GeoObjectCollection": { "featureMember": members } } }).to_string()
    }

    fn geocoder(url: String) -> Geocoder {
        Geocoder::new("secret".to_string()).with_base_url(url)
    }

    fn response(positions: &[&str]) -> GeocoderResponse {
        let members: Vec<_> = positions
            .iter()
            .map(|pos| json!({ "GeoObject": { "name": "Москва", "Point": { "pos": pos } } }))
            .collect();
        serde_json::from_value(json!({
            "response": {
                "GeoObjectCollection": {
                    "metaDataProperty": {},
                    "featureMember": members,
                }
            }
        }))
        .unwrap()
    }

    #[test]
    fn swaps_lon_lat() {
        assert_eq!(
            response(&["37.6173 55.7558"]).most_relevant().unwrap(),
            Geocoded::Found(Coordinate::new(55.7558, 37.6173))
        );
    }

    #[test]
    fn takes_first_feature() {
        assert_eq!(
            response(&["37.6 55.7", "30.3 59.9"]).most_relevant().unwrap(),
            Geocoded::Found(Coordinate::new(55.7, 37.6))
        );
    }

    #[test]
    fn empty_collection_is_not_found() {
        assert_eq!(response(&[]).most_relevant().unwrap(), Geocoded::NotFound);
    }

    #[test]
    fn malformed_position() {
        assert!(response(&["37.6173"]).most_relevant().is_err());
        assert!(response(&["east north"]).most_relevant().is_err());
    }

    #[test]
    fn unexpected_shape() {
        let x: Result<GeocoderResponse, _> =
            serde_json::from_value(json!({ "response": { "featureMember": [] } }));
        assert!(x.is_err());
    }

    #[test]
    fn locate_sends_query() {
        let (url, server) = serve("200 OK", &feature_collection(&["37.6173 55.7558"]));
        let found = geocoder(url).locate("Moscow").unwrap();
        assert_eq!(found, Geocoded::Found(Coordinate::new(55.7558, 37.6173)));

        let request_line = server.join().unwrap();
        assert!(request_line.starts_with("GET /1.x?"), "{request_line}");
        assert!(request_line.contains("geocode=Moscow"), "{request_line}");
        assert!(request_line.contains("apikey=secret"), "{request_line}");
        assert!(request_line.contains("format=json"), "{request_line}");
    }

    #[test]
    fn locate_not_found() {
        let (url, server) = serve("200 OK", &feature_collection(&[]));
        assert_eq!(geocoder(url).locate("nowhere").unwrap(), Geocoded::NotFound);
        server.join().unwrap();
    }

    #[test]
    fn locate_error_status() {
        let (url, server) = serve("403 Forbidden", r#"{"message": "Invalid api key"}"#);
        let err = geocoder(url).locate("Moscow").unwrap_err();
        server.join().unwrap();

        let message = format!("{err:#}");
        assert!(message.contains("403"), "{message}");
        assert!(!message.contains("secret"), "{message}");
    }

    #[test]
    fn locate_non_json_body() {
        let (url, server) = serve("200 OK", "<html>busy</html>");
        assert!(geocoder(url).locate("Moscow").is_err());
        server.join().unwrap();
    }
}
