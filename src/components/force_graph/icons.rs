//! Node icon selection.
//!
//! Icons are keyed by protocol. Generic HTTP transports are shared by many
//! managed services, so for those the node title is matched against known
//! service keywords first.

/// Icon drawn inside a node circle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeIcon {
	/// Redis protocol.
	Redis,
	/// gRPC protocol.
	Grpc,
	/// MySQL protocol.
	MySql,
	/// MongoDB protocol.
	MongoDb,
	/// Kafka, by title on generic HTTP.
	Kafka,
	/// DynamoDB, by title on generic HTTP.
	DynamoDb,
	/// ElasticExpress, by title on generic HTTP.
	ElasticExpress,
	/// Kinesis, by title on generic HTTP.
	Kinesis,
	/// SQS, by title on generic HTTP.
	Sqs,
	/// Plain HTTP service.
	Http,
	/// Unknown protocol.
	Default,
}

/// Title keywords checked, in order, for generic HTTP protocols.
const TITLE_KEYWORDS: &[(&str, NodeIcon)] = &[
	("kafka", NodeIcon::Kafka),
	("dynamodb", NodeIcon::DynamoDb),
	("elasticexpress", NodeIcon::ElasticExpress),
	("kinesis", NodeIcon::Kinesis),
	("sqs", NodeIcon::Sqs),
];

impl NodeIcon {
	/// Every icon, for preloading.
	pub const ALL: [NodeIcon; 11] = [
		NodeIcon::Redis,
		NodeIcon::Grpc,
		NodeIcon::MySql,
		NodeIcon::MongoDb,
		NodeIcon::Kafka,
		NodeIcon::DynamoDb,
		NodeIcon::ElasticExpress,
		NodeIcon::Kinesis,
		NodeIcon::Sqs,
		NodeIcon::Http,
		NodeIcon::Default,
	];

	/// Pick the icon for a node from its protocol and title.
	pub fn for_node(protocol: Option<&str>, title: &str) -> Self {
		match protocol {
			Some("Redis") => NodeIcon::Redis,
			Some("gRPC") => NodeIcon::Grpc,
			Some("MySQL") => NodeIcon::MySql,
			Some("MongoDB") => NodeIcon::MongoDb,
			Some("HTTP_TLS" | "HTTP") => {
				let title = title.to_lowercase();
				TITLE_KEYWORDS
					.iter()
					.find(|(keyword, _)| title.contains(keyword))
					.map(|(_, icon)| *icon)
					.unwrap_or(NodeIcon::Http)
			}
			_ => NodeIcon::Default,
		}
	}

	/// Image path relative to the served page.
	pub fn asset_path(self) -> &'static str {
		match self {
			NodeIcon::Redis => "img/redis.png",
			NodeIcon::Grpc => "img/grpc.png",
			NodeIcon::MySql => "img/mysql.png",
			NodeIcon::MongoDb => "img/mongodb.png",
			NodeIcon::Kafka => "img/kafka.png",
			NodeIcon::DynamoDb => "img/dynamodb.png",
			NodeIcon::ElasticExpress => "img/elasticexpress.png",
			NodeIcon::Kinesis => "img/kinesis.png",
			NodeIcon::Sqs => "img/sqs.png",
			NodeIcon::Http => "img/http.png",
			NodeIcon::Default => "img/default.png",
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn protocol_lookup() {
		assert_eq!(NodeIcon::for_node(Some("Redis"), "cache"), NodeIcon::Redis);
		assert_eq!(NodeIcon::for_node(Some("gRPC"), "kafka-bridge"), NodeIcon::Grpc);
		assert_eq!(NodeIcon::for_node(Some("MySQL"), "db"), NodeIcon::MySql);
		assert_eq!(NodeIcon::for_node(Some("MongoDB"), "db"), NodeIcon::MongoDb);
	}

	#[test]
	fn generic_http_uses_title_keywords() {
		let http = Some("HTTP_TLS");
		assert_eq!(NodeIcon::for_node(http, "Orders-Kafka-Proxy"), NodeIcon::Kafka);
		assert_eq!(NodeIcon::for_node(http, "dynamodb.us-east-1"), NodeIcon::DynamoDb);
		assert_eq!(NodeIcon::for_node(http, "elasticexpress-search"), NodeIcon::ElasticExpress);
		assert_eq!(NodeIcon::for_node(http, "KINESIS stream"), NodeIcon::Kinesis);
		assert_eq!(NodeIcon::for_node(http, "sqs.amazonaws.com"), NodeIcon::Sqs);
		assert_eq!(NodeIcon::for_node(http, "payments"), NodeIcon::Http);
		assert_eq!(NodeIcon::for_node(Some("HTTP"), "sqs-worker"), NodeIcon::Sqs);
	}

	#[test]
	fn falls_back_to_default() {
		assert_eq!(NodeIcon::for_node(None, "kafka"), NodeIcon::Default);
		assert_eq!(NodeIcon::for_node(Some("DNS"), "resolver"), NodeIcon::Default);
		assert_eq!(NodeIcon::for_node(Some("redis"), "cache"), NodeIcon::Default);
	}

	#[test]
	fn every_icon_has_an_asset() {
		for icon in NodeIcon::ALL {
			assert!(icon.asset_path().ends_with(".png"));
		}
	}
}
