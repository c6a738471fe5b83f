//! # Entity Registry
//!
//! Owns every entity and system, runs the tick pipeline and applies
//! replicated entity updates.
//!
//! ## Tick pipeline
//!
//! ```text
//! run_tick(dt)
//!   ├─ BeforeUpdate   systems see the pre-tick entity set
//!   ├─ flush          queued destructions applied, EntityDestroyed emitted
//!   ├─ Update
//!   ├─ AfterUpdate
//!   └─ Render
//! ```
//!
//! Each active system receives only the entities that hold all of its
//! required components. Those lists are cached per system and dropped on
//! every structural change (entity created or destroyed, component
//! attached or removed).
//!
//! ## Inbound updates
//!
//! An [`EntityUpdate`] is decoded in full before anything is assigned, so a
//! corrupt payload drops the whole update for that entity and leaves the
//! registry untouched. Batches isolate failures per entity.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use strata_shared::{EntityId, EntityUpdate, KindId, Notification};
use tracing::{debug, info, warn};

use super::component::ComponentType;
use super::entity::Entity;
use super::instance::ComponentInstance;
use super::kinds::ComponentTypes;
use super::notify::{NotificationBus, NotificationReceiver};
use super::schema::ComponentSchema;
use super::snapshot::{hash_entities, Snapshot};
use super::system::{run_phase_hook, Phase, Runner, RunsOn, System, SystemId, TickTime};
use super::template::TemplateResolver;
use crate::codec::PropertyValue;
use crate::config::RegistryConfig;
use crate::error::{ConfigError, EcsError, EcsResult};
use crate::time::{Clock, SystemClock};

/// How inbound updates are applied.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplyMode {
    /// Decode straight onto the components.
    #[default]
    Instant,
    /// Queue as interpolation samples.
    Interpolated,
}

/// Outcome of [`Registry::apply_batch`].
#[derive(Debug, Default)]
pub struct ApplyReport {
    /// Updates applied in full.
    pub applied: usize,
    /// Dropped updates and why.
    pub failures: Vec<(EntityId, EcsError)>,
}

impl ApplyReport {
    /// Returns true if nothing was dropped.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

struct SystemSlot {
    name: String,
    required: Vec<KindId>,
    runs_on: RunsOn,
    active: bool,
    system: Option<Box<dyn System>>,
    matches: Option<Vec<EntityId>>,
}

/// Decoded payloads of one update: schema plus `(index, value)` pairs.
type DecodedUpdate = Vec<(Arc<ComponentSchema>, Vec<(u8, PropertyValue)>)>;

/// The entity registry.
pub struct Registry {
    types: Arc<ComponentTypes>,
    config: RegistryConfig,
    clock: Arc<dyn Clock>,
    templates: Option<Arc<dyn TemplateResolver>>,
    entities: BTreeMap<EntityId, Entity>,
    next_id: EntityId,
    systems: Vec<SystemSlot>,
    pipeline: Vec<SystemId>,
    pending_destroy: Vec<EntityId>,
    bus: NotificationBus,
    tick: u64,
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("runner", &self.config.runner)
            .field("tick", &self.tick)
            .field("entities", &self.entities.len())
            .field("systems", &self.systems.len())
            .field("next_id", &self.next_id)
            .finish_non_exhaustive()
    }
}

impl Registry {
    /// Creates an empty registry over a frozen kind table.
    #[must_use]
    pub fn new(types: Arc<ComponentTypes>, config: RegistryConfig) -> Self {
        let bus = NotificationBus::new(config.notification_backlog);
        Self {
            types,
            config,
            clock: Arc::new(SystemClock::new()),
            templates: None,
            entities: BTreeMap::new(),
            next_id: EntityId(0),
            systems: Vec::new(),
            pipeline: Vec::new(),
            pending_destroy: Vec::new(),
            bus,
            tick: 0,
        }
    }

    /// Replaces the clock used for interpolation timestamps.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Installs the template resolver.
    #[must_use]
    pub fn with_templates(mut self, templates: Arc<dyn TemplateResolver>) -> Self {
        self.templates = Some(templates);
        self
    }

    /// Kind table.
    #[must_use]
    pub fn types(&self) -> &Arc<ComponentTypes> {
        &self.types
    }

    /// Configuration.
    #[must_use]
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Side this registry runs on.
    #[must_use]
    pub fn runner(&self) -> Runner {
        self.config.runner
    }

    /// Number of ticks run.
    #[must_use]
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// Current clock reading in seconds.
    #[must_use]
    pub fn now(&self) -> f64 {
        self.clock.now()
    }

    // ========================================================================
    // NOTIFICATIONS
    // ========================================================================

    /// Consumer handle for registry notifications.
    #[must_use]
    pub fn notifications(&self) -> NotificationReceiver {
        self.bus.receiver()
    }

    /// Takes every pending notification.
    #[must_use]
    pub fn drain_notifications(&self) -> Vec<Notification> {
        self.bus.receiver().drain()
    }

    /// Notifications waiting to be drained.
    #[must_use]
    pub fn pending_notifications(&self) -> usize {
        self.bus.pending()
    }

    fn invalidate(&mut self) {
        for slot in &mut self.systems {
            slot.matches = None;
        }
    }

    fn schema_named(&self, name: &str) -> EcsResult<Arc<ComponentSchema>> {
        self.types
            .schema_by_name(name)
            .cloned()
            .ok_or_else(|| EcsError::UnknownComponentKind(name.to_owned()))
    }

    // ========================================================================
    // ENTITIES
    // ========================================================================

    /// Creates an entity. Without `id` the next free id is allocated.
    ///
    /// # Errors
    ///
    /// [`EcsError::EntityExists`] if an explicit `id` is taken.
    pub fn create_entity(&mut self, id: Option<EntityId>) -> EcsResult<EntityId> {
        let id = match id {
            Some(id) if self.entities.contains_key(&id) => return Err(EcsError::EntityExists(id)),
            Some(id) => {
                if id >= self.next_id {
                    self.next_id = id.next();
                }
                id
            }
            None => {
                let mut id = self.next_id;
                while self.entities.contains_key(&id) {
                    id = id.next();
                }
                self.next_id = id.next();
                id
            }
        };

        self.entities.insert(id, Entity::new(id));
        self.bus.send(Notification::EntityAdded { entity: id });
        self.invalidate();
        debug!(entity = %id, "Entity created");
        Ok(id)
    }

    /// Creates an entity from a named template, base templates first.
    ///
    /// The full chain is materialized before the entity exists, so a bad
    /// template creates nothing.
    ///
    /// # Errors
    ///
    /// Template lookup and value errors, unknown kinds or properties, and
    /// [`EcsError::EntityExists`] for a taken explicit `id`.
    pub fn create_entity_from_template(
        &mut self,
        name: &str,
        id: Option<EntityId>,
    ) -> EcsResult<EntityId> {
        let components = self.materialize_template(name)?;
        let entity = self.create_entity(id)?;
        for component in components {
            self.attach(entity, component)?;
        }
        debug!(entity = %entity, template = name, "Entity created from template");
        Ok(entity)
    }

    fn materialize_template(&self, name: &str) -> EcsResult<Vec<ComponentInstance>> {
        let resolver = self
            .templates
            .as_ref()
            .ok_or_else(|| EcsError::TemplateNotFound(name.to_owned()))?;

        // Leaf first; applied in reverse so extensions override their base.
        let mut chain = Vec::new();
        let mut visited = HashSet::new();
        let mut current = Some(name.to_owned());
        while let Some(template_name) = current {
            if !visited.insert(template_name.clone()) {
                return Err(EcsError::TemplateCycle(template_name));
            }
            let template = resolver
                .resolve(&template_name)
                .ok_or_else(|| EcsError::TemplateNotFound(template_name.clone()))?;
            current = template.extends.clone();
            chain.push((template_name, template));
        }

        let mut components: Vec<ComponentInstance> = Vec::new();
        for (template_name, template) in chain.iter().rev() {
            for entry in &template.components {
                let schema = self.schema_named(&entry.kind)?;
                let slot = match components.iter().position(|c| c.kind_id() == schema.kind_id()) {
                    Some(slot) => slot,
                    None => {
                        components.push(ComponentInstance::new(Arc::clone(&schema)));
                        components.len() - 1
                    }
                };
                for (property, raw) in &entry.properties {
                    let descriptor =
                        schema
                            .property(property)
                            .ok_or_else(|| EcsError::UnknownProperty {
                                component: schema.name(),
                                property: property.clone(),
                            })?;
                    let value = raw.to_property(&descriptor.kind).ok_or_else(|| {
                        EcsError::InvalidTemplateValue {
                            template: template_name.clone(),
                            component: schema.name(),
                            property: property.clone(),
                            expected: descriptor.kind.clone(),
                        }
                    })?;
                    components[slot].set(property, value)?;
                }
            }
        }
        Ok(components)
    }

    /// Queues an entity for destruction at the start of the next `Update`.
    ///
    /// # Errors
    ///
    /// [`EcsError::EntityNotFound`] if no such entity exists.
    pub fn destroy_entity(&mut self, entity: EntityId) -> EcsResult<()> {
        if !self.entities.contains_key(&entity) {
            return Err(EcsError::EntityNotFound(entity));
        }
        if !self.pending_destroy.contains(&entity) {
            self.pending_destroy.push(entity);
            debug!(entity = %entity, "Entity queued for destruction");
        }
        Ok(())
    }

    /// Returns true if the entity is queued for destruction.
    #[must_use]
    pub fn is_pending_destroy(&self, entity: EntityId) -> bool {
        self.pending_destroy.contains(&entity)
    }

    fn flush_destroyed(&mut self) -> usize {
        if self.pending_destroy.is_empty() {
            return 0;
        }
        let mut removed = 0;
        for entity in std::mem::take(&mut self.pending_destroy) {
            if self.entities.remove(&entity).is_some() {
                removed += 1;
                self.bus.send(Notification::EntityDestroyed { entity });
            }
        }
        if removed > 0 {
            self.invalidate();
            debug!(removed, "Destroyed entities flushed");
        }
        removed
    }

    /// Entity by id.
    #[must_use]
    pub fn entity(&self, entity: EntityId) -> Option<&Entity> {
        self.entities.get(&entity)
    }

    /// Returns true if the entity exists (pending destruction included).
    #[must_use]
    pub fn contains(&self, entity: EntityId) -> bool {
        self.entities.contains_key(&entity)
    }

    /// All entities in ascending id order.
    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    /// Number of entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Returns true if there are no entities.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    // ========================================================================
    // COMPONENTS
    // ========================================================================

    /// Attaches a typed component.
    ///
    /// # Errors
    ///
    /// Lookup errors, or the fatal [`EcsError::DuplicateComponent`].
    pub fn add_component<T: ComponentType>(&mut self, entity: EntityId, component: T) -> EcsResult<()> {
        let schema = self.schema_named(T::NAME)?;
        self.attach(entity, ComponentInstance::from_data(schema, Box::new(component)))
    }

    /// Attaches a default-valued component of the named kind.
    ///
    /// # Errors
    ///
    /// Lookup errors, or the fatal [`EcsError::DuplicateComponent`].
    pub fn add_default_component(&mut self, entity: EntityId, kind: &str) -> EcsResult<()> {
        let schema = self.schema_named(kind)?;
        self.attach(entity, ComponentInstance::new(schema))
    }

    /// Attaches a prepared component instance.
    ///
    /// Emits one change notification per declared property if the kind
    /// notifies on create; observes later mutations if it notifies on
    /// mutation.
    ///
    /// # Errors
    ///
    /// Lookup errors, or the fatal [`EcsError::DuplicateComponent`].
    pub fn add_component_instance(
        &mut self,
        entity: EntityId,
        component: ComponentInstance,
    ) -> EcsResult<()> {
        self.attach(entity, component)
    }

    fn attach(&mut self, entity: EntityId, mut component: ComponentInstance) -> EcsResult<()> {
        let policy = component.schema().policy();
        component.set_observed(policy.notify_on_mutation);

        let record = self
            .entities
            .get_mut(&entity)
            .ok_or(EcsError::EntityNotFound(entity))?;
        let attached = record.insert(component)?;
        let created: Vec<Notification> = if policy.notify_on_create {
            attached
                .declared_properties()
                .map(|p| Notification::PropertyChanged {
                    entity,
                    component: attached.name(),
                    property: p.name,
                    policy,
                })
                .collect()
        } else {
            Vec::new()
        };
        let name = attached.name();

        for notification in created {
            self.bus.send(notification);
        }
        self.invalidate();
        debug!(entity = %entity, component = name, "Component attached");
        Ok(())
    }

    /// Detaches a component.
    ///
    /// # Errors
    ///
    /// Lookup errors if the entity, kind or component does not exist.
    pub fn remove_component(&mut self, entity: EntityId, kind: &str) -> EcsResult<ComponentInstance> {
        let schema = self.schema_named(kind)?;
        let record = self
            .entities
            .get_mut(&entity)
            .ok_or(EcsError::EntityNotFound(entity))?;
        let removed = record
            .remove(schema.kind_id())
            .ok_or_else(|| EcsError::ComponentNotFound {
                entity,
                component: kind.to_owned(),
            })?;
        self.invalidate();
        debug!(entity = %entity, component = schema.name(), "Component removed");
        Ok(removed)
    }

    /// Typed component data.
    #[must_use]
    pub fn component<T: ComponentType>(&self, entity: EntityId) -> Option<&T> {
        self.entities.get(&entity)?.get::<T>()
    }

    /// Mutable typed component data. Report mutations with
    /// [`Registry::mark_changed`].
    pub fn component_mut<T: ComponentType>(&mut self, entity: EntityId) -> Option<&mut T> {
        self.entities.get_mut(&entity)?.get_mut::<T>()
    }

    /// Component instance by kind name.
    ///
    /// # Errors
    ///
    /// [`EcsError::EntityNotFound`] or [`EcsError::ComponentNotFound`].
    pub fn component_instance(&self, entity: EntityId, kind: &str) -> EcsResult<&ComponentInstance> {
        self.entities
            .get(&entity)
            .ok_or(EcsError::EntityNotFound(entity))?
            .component(kind)
            .ok_or_else(|| EcsError::ComponentNotFound {
                entity,
                component: kind.to_owned(),
            })
    }

    /// Mutable component instance by kind name.
    ///
    /// # Errors
    ///
    /// [`EcsError::EntityNotFound`] or [`EcsError::ComponentNotFound`].
    pub fn component_instance_mut(
        &mut self,
        entity: EntityId,
        kind: &str,
    ) -> EcsResult<&mut ComponentInstance> {
        self.entities
            .get_mut(&entity)
            .ok_or(EcsError::EntityNotFound(entity))?
            .component_mut(kind)
            .ok_or_else(|| EcsError::ComponentNotFound {
                entity,
                component: kind.to_owned(),
            })
    }

    /// Reads a property by name.
    ///
    /// # Errors
    ///
    /// Lookup errors.
    pub fn get_property(&self, entity: EntityId, kind: &str, property: &str) -> EcsResult<PropertyValue> {
        self.component_instance(entity, kind)?.get(property)
    }

    /// Writes a property by name, notifying if the component is observed.
    ///
    /// # Errors
    ///
    /// Lookup errors or [`EcsError::TypeMismatch`].
    pub fn set_property(
        &mut self,
        entity: EntityId,
        kind: &str,
        property: &str,
        value: impl Into<PropertyValue>,
    ) -> EcsResult<()> {
        let change = self
            .component_instance_mut(entity, kind)?
            .set(property, value.into())?;
        if let Some(change) = change {
            self.bus.send(change.into_notification(entity));
        }
        Ok(())
    }

    /// Reports an in-place mutation made through [`Registry::component_mut`].
    ///
    /// # Errors
    ///
    /// Lookup errors.
    pub fn mark_changed(&mut self, entity: EntityId, kind: &str, property: &str) -> EcsResult<()> {
        let change = self.component_instance(entity, kind)?.touch(property)?;
        if let Some(change) = change {
            self.bus.send(change.into_notification(entity));
        }
        Ok(())
    }

    // ========================================================================
    // SYSTEMS
    // ========================================================================

    /// Registers a system.
    ///
    /// Every system is indexed; only systems whose affinity (after config
    /// overrides) matches this registry's runner join the tick pipeline.
    ///
    /// # Errors
    ///
    /// [`ConfigError::UnknownRequiredComponent`] if a required kind is not
    /// registered.
    pub fn add_system<S: System + 'static>(&mut self, system: S) -> EcsResult<SystemId> {
        let name = system.name().to_owned();
        let required = system
            .required_components()
            .into_iter()
            .map(|kind| {
                self.types
                    .schema_by_name(kind)
                    .map(|s| s.kind_id())
                    .ok_or_else(|| ConfigError::UnknownRequiredComponent {
                        system: name.clone(),
                        component: kind.to_owned(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let runs_on = self
            .config
            .runner_override(&name)
            .unwrap_or_else(|| system.runs_on());
        let active = runs_on.matches(self.config.runner);
        let id = SystemId(self.systems.len());

        info!(system = %name, ?runs_on, active, "Registered system");
        self.systems.push(SystemSlot {
            name,
            required,
            runs_on,
            active,
            system: Some(Box::new(system)),
            matches: None,
        });
        if active {
            self.pipeline.push(id);
        }
        Ok(id)
    }

    /// Entities holding every component the system requires.
    ///
    /// Computed lazily and cached until the next structural change.
    ///
    /// # Errors
    ///
    /// [`EcsError::UnknownSystem`] for an invalid id.
    pub fn entities_for(&mut self, system: SystemId) -> EcsResult<&[EntityId]> {
        let slot = self
            .systems
            .get_mut(system.0)
            .ok_or(EcsError::UnknownSystem(system.0))?;
        if slot.matches.is_none() {
            let matches = self
                .entities
                .values()
                .filter(|e| e.has_all(&slot.required))
                .map(Entity::id)
                .collect();
            slot.matches = Some(matches);
        }
        Ok(slot.matches.as_deref().unwrap_or(&[]))
    }

    /// Name of a registered system.
    #[must_use]
    pub fn system_name(&self, system: SystemId) -> Option<&str> {
        self.systems.get(system.0).map(|s| s.name.as_str())
    }

    /// Effective affinity of a registered system.
    #[must_use]
    pub fn system_runs_on(&self, system: SystemId) -> Option<RunsOn> {
        self.systems.get(system.0).map(|s| s.runs_on)
    }

    /// Returns true if the system is part of the tick pipeline.
    #[must_use]
    pub fn is_active(&self, system: SystemId) -> bool {
        self.systems.get(system.0).map_or(false, |s| s.active)
    }

    /// Number of registered systems, active or not.
    #[must_use]
    pub fn system_count(&self) -> usize {
        self.systems.len()
    }

    /// Runs one tick through every phase.
    pub fn run_tick(&mut self, delta: f64) -> TickTime {
        self.tick += 1;
        let time = TickTime {
            tick: self.tick,
            delta,
        };
        for phase in Phase::ALL {
            if phase == Phase::Update {
                self.flush_destroyed();
            }
            self.run_phase(phase, &time);
        }
        time
    }

    fn run_phase(&mut self, phase: Phase, time: &TickTime) {
        let mut cursor = 0;
        while let Some(&id) = self.pipeline.get(cursor) {
            cursor += 1;
            let entities = match self.entities_for(id) {
                Ok(entities) => entities.to_vec(),
                Err(_) => continue,
            };
            let Some(mut system) = self.systems[id.0].system.take() else {
                continue;
            };
            run_phase_hook(system.as_mut(), phase, self, &entities, time);
            self.systems[id.0].system = Some(system);
        }
    }

    // ========================================================================
    // INBOUND UPDATES
    // ========================================================================

    fn decode_update(&self, update: &EntityUpdate) -> EcsResult<DecodedUpdate> {
        if !self.entities.contains_key(&update.entity) {
            return Err(EcsError::EntityNotFound(update.entity));
        }
        update
            .components
            .iter()
            .map(|payload| {
                let schema = self
                    .types
                    .schema(payload.kind)
                    .cloned()
                    .ok_or(EcsError::UnknownKindId(payload.kind))?;
                let (values, _) = schema.decode_values(&payload.bytes, 0).map_err(|source| {
                    EcsError::Decode {
                        entity: update.entity,
                        source,
                    }
                })?;
                Ok((schema, values))
            })
            .collect()
    }

    /// Returns the entity's component of `schema`'s kind, attaching a
    /// default one first if absent. The flag is true if it was created.
    fn ensure_component(
        &mut self,
        entity: EntityId,
        schema: &Arc<ComponentSchema>,
    ) -> EcsResult<(&mut ComponentInstance, bool)> {
        let present = self
            .entities
            .get(&entity)
            .ok_or(EcsError::EntityNotFound(entity))?
            .has(schema.kind_id());
        if !present {
            self.attach(entity, ComponentInstance::new(Arc::clone(schema)))?;
        }
        let instance = self
            .entities
            .get_mut(&entity)
            .and_then(|e| e.component_by_kind_mut(schema.kind_id()))
            .ok_or_else(|| EcsError::ComponentNotFound {
                entity,
                component: schema.name().to_owned(),
            })?;
        Ok((instance, !present))
    }

    /// Decodes every payload of `update` onto the entity's components,
    /// creating missing ones.
    ///
    /// # Errors
    ///
    /// Lookup or decode errors; the entity is left untouched.
    pub fn apply_entity_update_instantly(&mut self, update: &EntityUpdate) -> EcsResult<()> {
        let decoded = self.decode_update(update)?;
        for (schema, values) in decoded {
            let (instance, _) = self.ensure_component(update.entity, &schema)?;
            instance.assign(values).map_err(|source| EcsError::Decode {
                entity: update.entity,
                source,
            })?;
        }
        Ok(())
    }

    /// Queues every payload of `update` as interpolation samples stamped
    /// with the clock's current time.
    ///
    /// # Errors
    ///
    /// Lookup or decode errors; the entity is left untouched.
    pub fn apply_entity_update_interpolated(&mut self, update: &EntityUpdate) -> EcsResult<()> {
        let now = self.clock.now();
        self.apply_entity_update_interpolated_at(update, now)
    }

    /// Queues every payload of `update` as samples at `timestamp`.
    ///
    /// Components created by this update first take the payload as their
    /// baseline value.
    ///
    /// # Errors
    ///
    /// Lookup or decode errors; the entity is left untouched.
    pub fn apply_entity_update_interpolated_at(
        &mut self,
        update: &EntityUpdate,
        timestamp: f64,
    ) -> EcsResult<()> {
        let decoded = self.decode_update(update)?;
        for (schema, values) in decoded {
            let (instance, created) = self.ensure_component(update.entity, &schema)?;
            if created {
                instance
                    .assign(values.clone())
                    .map_err(|source| EcsError::Decode {
                        entity: update.entity,
                        source,
                    })?;
            }
            instance.push_samples(values, timestamp);
        }
        Ok(())
    }

    /// Applies a batch, isolating failures per entity.
    pub fn apply_batch(&mut self, updates: &[EntityUpdate], mode: ApplyMode) -> ApplyReport {
        let now = self.clock.now();
        let mut report = ApplyReport::default();
        for update in updates {
            let result = match mode {
                ApplyMode::Instant => self.apply_entity_update_instantly(update),
                ApplyMode::Interpolated => self.apply_entity_update_interpolated_at(update, now),
            };
            match result {
                Ok(()) => report.applied += 1,
                Err(error) => {
                    warn!(entity = %update.entity, %error, "Dropped entity update");
                    report.failures.push((update.entity, error));
                }
            }
        }
        report
    }

    /// Moves every sampled property to its value at `now - render_delay`.
    /// Returns the number of properties assigned.
    pub fn apply_interpolation(&mut self, render_delay: f64) -> usize {
        let now = self.clock.now();
        self.entities
            .values_mut()
            .flat_map(Entity::components_mut)
            .map(|c| c.apply_interpolation(now, render_delay))
            .sum()
    }

    // ========================================================================
    // SNAPSHOTS & HASHING
    // ========================================================================

    /// Deep copy of every entity.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::new(self.tick, self.next_id, self.entities.values().cloned().collect())
    }

    /// Replaces the live entity set with a snapshot's.
    ///
    /// The id allocator restarts after the highest restored id; pending
    /// destructions and cached system matches are discarded.
    pub fn restore_snapshot(&mut self, snapshot: &Snapshot) {
        self.entities = snapshot
            .entities()
            .iter()
            .map(|e| (e.id(), e.clone()))
            .collect();
        self.next_id = self
            .entities
            .keys()
            .next_back()
            .map_or(EntityId(0), |id| id.next());
        self.tick = snapshot.tick();
        self.pending_destroy.clear();
        self.invalidate();
        info!(
            tick = self.tick,
            entities = self.entities.len(),
            "Snapshot restored"
        );
    }

    /// Order-stable hash of the whole entity set.
    #[must_use]
    pub fn content_hash(&self) -> u64 {
        hash_entities(self.entities.values())
    }
}
