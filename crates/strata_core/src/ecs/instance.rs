//! # Component Instances
//!
//! A component's data paired with its schema and its replication state:
//! per-property sample queues and the outbound throttle.
//!
//! ## Payload layout
//!
//! ```text
//! [u16 mask][value idx a][value idx b]...    a < b, one value per set bit
//! ```

use std::collections::BTreeMap;
use std::hash::Hasher;
use std::sync::Arc;

use siphasher::sip::SipHasher13;
use strata_shared::{EntityId, KindId, NetworkPolicy, Notification};
use tracing::{debug, trace};

use super::component::{Component, ComponentType};
use super::schema::{ComponentSchema, PropertyDescriptor};
use crate::codec::{ByteWriter, PropertyMask, PropertyValue};
use crate::error::{CodecError, DecodeError, EcsError, EcsResult};
use crate::interpolation::SampleQueue;

/// Fixed SipHash keys. Changing them changes every content hash.
const HASH_KEYS: (u64, u64) = (0x5354_5241_5441_0001, 0x6865_6164_6572_0010);

pub(crate) fn stable_hasher() -> SipHasher13 {
    SipHasher13::new_with_keys(HASH_KEYS.0, HASH_KEYS.1)
}

/// A property mutation on an observed component.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PropertyChange {
    /// Component kind name.
    pub component: &'static str,
    /// Property name.
    pub property: &'static str,
    /// Policy of the component kind.
    pub policy: NetworkPolicy,
}

impl PropertyChange {
    /// Attaches the owning entity.
    #[must_use]
    pub const fn into_notification(self, entity: EntityId) -> Notification {
        Notification::PropertyChanged {
            entity,
            component: self.component,
            property: self.property,
            policy: self.policy,
        }
    }
}

/// A component attached (or about to be attached) to an entity.
#[derive(Debug)]
pub struct ComponentInstance {
    schema: Arc<ComponentSchema>,
    data: Box<dyn Component>,
    samples: BTreeMap<u8, SampleQueue>,
    last_sent_tick: Option<u64>,
    observed: bool,
}

impl ComponentInstance {
    /// Default-valued instance of the schema's kind.
    #[must_use]
    pub fn new(schema: Arc<ComponentSchema>) -> Self {
        let data = schema.instantiate();
        Self::from_data(schema, data)
    }

    /// Wraps existing component data.
    #[must_use]
    pub fn from_data(schema: Arc<ComponentSchema>, data: Box<dyn Component>) -> Self {
        Self {
            schema,
            data,
            samples: BTreeMap::new(),
            last_sent_tick: None,
            observed: false,
        }
    }

    /// Kind name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.schema.name()
    }

    /// Wire id of the kind.
    #[must_use]
    pub fn kind_id(&self) -> KindId {
        self.schema.kind_id()
    }

    /// Schema of the kind.
    #[must_use]
    pub fn schema(&self) -> &Arc<ComponentSchema> {
        &self.schema
    }

    /// Serialized properties in ascending index order.
    pub fn declared_properties(&self) -> impl Iterator<Item = &PropertyDescriptor> {
        self.schema.declared_properties()
    }

    /// Returns true if mutations emit change notifications.
    #[must_use]
    pub const fn is_observed(&self) -> bool {
        self.observed
    }

    pub(crate) fn set_observed(&mut self, observed: bool) {
        self.observed = observed;
    }

    fn descriptor(&self, property: &str) -> EcsResult<&PropertyDescriptor> {
        self.schema
            .property(property)
            .ok_or_else(|| EcsError::UnknownProperty {
                component: self.schema.name(),
                property: property.to_owned(),
            })
    }

    /// Reads a property by name.
    ///
    /// # Errors
    ///
    /// [`EcsError::UnknownProperty`] if the kind declares no such property.
    pub fn get(&self, property: &str) -> EcsResult<PropertyValue> {
        let descriptor = self.descriptor(property)?;
        self.data
            .get(descriptor.index)
            .ok_or_else(|| EcsError::UnknownProperty {
                component: self.schema.name(),
                property: property.to_owned(),
            })
    }

    /// Writes a property by name.
    ///
    /// Returns the change record when the component is observed and the
    /// property is serialized.
    ///
    /// # Errors
    ///
    /// [`EcsError::UnknownProperty`] or [`EcsError::TypeMismatch`].
    pub fn set(&mut self, property: &str, value: PropertyValue) -> EcsResult<Option<PropertyChange>> {
        let descriptor = self.descriptor(property)?;
        if !value.is_kind(&descriptor.kind) {
            return Err(EcsError::TypeMismatch(value.mismatch(descriptor.kind.clone())));
        }
        let (index, name, serialized) = (descriptor.index, descriptor.name, descriptor.serialized);
        self.data.set(index, value)?;
        Ok(self.change_for(name, serialized))
    }

    pub(crate) fn change_for(&self, property: &'static str, serialized: bool) -> Option<PropertyChange> {
        (self.observed && serialized).then_some(PropertyChange {
            component: self.schema.name(),
            property,
            policy: self.schema.policy(),
        })
    }

    /// Change record for `property` as if it had just been mutated.
    ///
    /// # Errors
    ///
    /// [`EcsError::UnknownProperty`] if the kind declares no such property.
    pub fn touch(&self, property: &str) -> EcsResult<Option<PropertyChange>> {
        let descriptor = self.descriptor(property)?;
        Ok(self.change_for(descriptor.name, descriptor.serialized))
    }

    /// Typed view of the data.
    #[must_use]
    pub fn data<T: ComponentType>(&self) -> Option<&T> {
        self.data.as_any().downcast_ref::<T>()
    }

    /// Mutable typed view of the data. Mutations through it are silent;
    /// report them with [`ComponentInstance::touch`].
    pub fn data_mut<T: ComponentType>(&mut self) -> Option<&mut T> {
        self.data.as_any_mut().downcast_mut::<T>()
    }

    // ========================================================================
    // WIRE
    // ========================================================================

    /// Encodes the named properties: header, then values in ascending index
    /// order regardless of the order of `properties`.
    ///
    /// # Errors
    ///
    /// [`EcsError::UnknownProperty`] for names that are not serialized
    /// properties of this kind.
    pub fn encode(&self, properties: &[&str]) -> EcsResult<Vec<u8>> {
        let mut mask = PropertyMask::EMPTY;
        for &name in properties {
            match self.schema.property(name) {
                Some(p) if p.serialized => {
                    mask.insert(p.index);
                }
                _ => {
                    return Err(EcsError::UnknownProperty {
                        component: self.schema.name(),
                        property: name.to_owned(),
                    })
                }
            }
        }
        Ok(self.encode_mask(mask)?)
    }

    /// Encodes the properties whose bits are set in `mask`. Bits without a
    /// serialized property are dropped from the header.
    ///
    /// # Errors
    ///
    /// Only if the component's accessors disagree with its schema.
    pub fn encode_mask(&self, mask: PropertyMask) -> Result<Vec<u8>, CodecError> {
        let included: Vec<&PropertyDescriptor> = mask
            .iter()
            .filter_map(|index| self.schema.property_at(index))
            .collect();

        let mut out = ByteWriter::with_capacity(2 + included.len() * 4);
        included.iter().map(|p| p.index).collect::<PropertyMask>().write(&mut out);
        for p in included {
            let value = self
                .data
                .get(p.index)
                .unwrap_or_else(|| p.kind.default_value());
            p.codec.encode(&value, &mut out)?;
        }
        Ok(out.into_vec())
    }

    /// Encodes every serialized property.
    ///
    /// # Errors
    ///
    /// Only if the component's accessors disagree with its schema.
    pub fn encode_all(&self) -> Result<Vec<u8>, CodecError> {
        self.encode_mask(self.schema.full_mask())
    }

    /// Decodes a payload at `offset` and assigns the included properties.
    /// Returns the bytes consumed.
    ///
    /// Nothing is assigned unless the whole payload decodes.
    ///
    /// # Errors
    ///
    /// Any [`DecodeError`].
    pub fn decode(&mut self, bytes: &[u8], offset: usize) -> Result<usize, DecodeError> {
        let (values, consumed) = self.schema.decode_values(bytes, offset)?;
        self.assign(values)?;
        Ok(consumed)
    }

    pub(crate) fn assign(&mut self, values: Vec<(u8, PropertyValue)>) -> Result<(), DecodeError> {
        for (index, value) in values {
            self.data.set(index, value).map_err(|mismatch| DecodeError::Property {
                component: self.schema.name(),
                property: self.schema.property_at(index).map_or("?", |p| p.name),
                source: mismatch.into(),
            })?;
        }
        Ok(())
    }

    /// Decodes a payload at `offset` and queues each included value as a
    /// sample at `timestamp` instead of assigning it. Returns the bytes
    /// consumed.
    ///
    /// # Errors
    ///
    /// Any [`DecodeError`]; no sample is queued in that case.
    pub fn push_interpolation_sample(
        &mut self,
        bytes: &[u8],
        offset: usize,
        timestamp: f64,
    ) -> Result<usize, DecodeError> {
        let (values, consumed) = self.schema.decode_values(bytes, offset)?;
        self.push_samples(values, timestamp);
        Ok(consumed)
    }

    pub(crate) fn push_samples(&mut self, values: Vec<(u8, PropertyValue)>, timestamp: f64) {
        for (index, value) in values {
            match self.samples.get_mut(&index) {
                Some(queue) => {
                    if !queue.push(timestamp, value) {
                        debug!(
                            component = self.schema.name(),
                            index,
                            timestamp,
                            "Discarded stale interpolation sample"
                        );
                    }
                }
                None => {
                    self.samples.insert(index, SampleQueue::seeded(timestamp, value));
                }
            }
        }
    }

    /// Moves every sampled property to its value at `now - render_delay`.
    /// Returns the number of properties assigned.
    pub fn apply_interpolation(&mut self, now: f64, render_delay: f64) -> usize {
        let render_ts = now - render_delay;
        let mut assigned = 0;
        for p in self.schema.declared_properties() {
            let Some(queue) = self.samples.get_mut(&p.index) else {
                continue;
            };
            if let Some(value) = queue.resolve(render_ts, p.mode, &p.strategy) {
                if self.data.set(p.index, value).is_ok() {
                    assigned += 1;
                }
            }
        }
        if assigned > 0 {
            trace!(component = self.schema.name(), assigned, render_ts, "Interpolated");
        }
        assigned
    }

    /// Sample queue of a property, if one exists.
    #[must_use]
    pub fn samples(&self, property: &str) -> Option<&SampleQueue> {
        let p = self.schema.property(property)?;
        self.samples.get(&p.index)
    }

    /// Drops all interpolation state.
    pub fn clear_samples(&mut self) {
        self.samples.clear();
    }

    // ========================================================================
    // THROTTLING & HASHING
    // ========================================================================

    /// Outbound throttle. Returns true, recording `tick`, iff at least
    /// `min_update_interval` ticks passed since the last recorded send.
    /// The first call always passes.
    pub fn should_send_update(&mut self, tick: u64) -> bool {
        let interval = self.schema.policy().min_update_interval;
        let due = self
            .last_sent_tick
            .map_or(true, |last| tick >= last.saturating_add(interval));
        if due {
            self.last_sent_tick = Some(tick);
        }
        due
    }

    /// Tick of the last permitted send.
    #[must_use]
    pub const fn last_sent_tick(&self) -> Option<u64> {
        self.last_sent_tick
    }

    /// Stable hash over every serialized property's encoded value.
    #[must_use]
    pub fn content_hash(&self) -> u64 {
        let mut hasher = stable_hasher();
        let mut scratch = ByteWriter::new();
        for p in self.schema.declared_properties() {
            let Some(value) = self.data.get(p.index) else {
                continue;
            };
            scratch.truncate(0);
            if p.codec.encode(&value, &mut scratch).is_ok() {
                hasher.write_u8(p.index);
                hasher.write(scratch.as_slice());
            }
        }
        hasher.finish()
    }
}

impl Clone for ComponentInstance {
    /// Deep copy of the data. Interpolation state is not carried over.
    fn clone(&self) -> Self {
        Self {
            schema: Arc::clone(&self.schema),
            data: self.data.clone_boxed(),
            samples: BTreeMap::new(),
            last_sent_tick: self.last_sent_tick,
            observed: self.observed,
        }
    }
}
