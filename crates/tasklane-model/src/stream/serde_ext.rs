pub(crate) mod rfc3339_seq {
    use serde::{Deserialize, Deserializer, Serialize, Serializer, de, ser};
    use time::{OffsetDateTime, format_description::well_known::Rfc3339};

    pub fn serialize<S>(items: &[OffsetDateTime], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let formatted = items
            .iter()
            .map(|t| t.format(&Rfc3339).map_err(ser::Error::custom))
            .collect::<Result<Vec<_>, _>>()?;
        formatted.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<OffsetDateTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Vec::<String>::deserialize(deserializer)?
            .iter()
            .map(|s| OffsetDateTime::parse(s, &Rfc3339).map_err(de::Error::custom))
            .collect()
    }
}

/// JSON object keys must be strings, so the lane map travels as a list of entries.
pub(crate) mod lane_entries {
    use std::collections::BTreeMap;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use crate::{DisplayBucket, Lane, LaneKey};

    #[derive(Serialize)]
    struct EntryRef<'a> {
        func_name: &'a str,
        lane: Lane,
        bucket: &'a DisplayBucket,
    }

    #[derive(Deserialize)]
    struct Entry {
        func_name: String,
        lane: Lane,
        bucket: DisplayBucket,
    }

    pub fn serialize<S>(
        lanes: &BTreeMap<LaneKey, DisplayBucket>,
        serializer: S,
    ) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_seq(lanes.iter().map(|(key, bucket)| EntryRef {
            func_name: &key.func_name,
            lane: key.lane,
            bucket,
        }))
    }

    pub fn deserialize<'de, D>(
        deserializer: D,
    ) -> Result<BTreeMap<LaneKey, DisplayBucket>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let entries = Vec::<Entry>::deserialize(deserializer)?;
        Ok(entries
            .into_iter()
            .map(|e| (LaneKey::new(e.func_name, e.lane), e.bucket))
            .collect())
    }
}
