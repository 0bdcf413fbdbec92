use std::collections::VecDeque;
use std::fmt::{self, Write as _};
use std::mem;

use bevy::ecs::message::Messages;
use bevy::prelude::*;

use super::ModifierHud;
use super::context::ModifierContext;
use super::error::{ModifierError, ModifierResult};
use super::modifier::{ActiveModifier, Modifier, ModifierHandle, ModifierKind};
use super::registry::ModifierRegistry;
use crate::game::components::LocalControl;
use crate::game::events::ModifierEvent;
use crate::game::types::ModifierId;

// ── Collection component ────────────────────────────────────────────

/// Active modifiers of one entity, in attach order.
///
/// The collection is the only owner of its modifiers. All mutation goes through
/// [`ModifierWorldExt`] (or [`ModifierCommandsExt`]), which runs the lifecycle hooks.
/// While the collection's own hooks run, add/remove/clear requests are validated
/// right away and queued until the pass is over. The presence queries (`has*`, `len`)
/// still see the modifiers whose hooks are running; borrows (`get`, `iter`) do not.
#[derive(Component, Default)]
pub struct ModifierCollection {
    modifiers: Vec<ActiveModifier>,
    pending: VecDeque<PendingOp>,
    busy: bool,
    /// Modifiers taken out while their hooks run.
    in_flight: Vec<Slot>,
    /// What will be attached once the queued requests are applied.
    projected: Vec<Slot>,
    next_instance: u64,
}

#[derive(Debug, Clone)]
struct Slot {
    id: ModifierId,
    kind: ModifierKind,
    handle: ModifierHandle,
    name: String,
}

impl Slot {
    fn of(active: &ActiveModifier) -> Self {
        Self {
            id: active.id,
            kind: active.kind,
            handle: active.handle(),
            name: active.name().to_string(),
        }
    }
}

impl ModifierCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ActiveModifier> {
        self.modifiers.iter()
    }

    pub fn len(&self) -> usize {
        self.modifiers.len() + self.in_flight.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn has<M: Modifier>(&self) -> bool {
        self.has_kind(&ModifierKind::of::<M>())
    }

    pub fn has_kind(&self, kind: &ModifierKind) -> bool {
        self.modifiers.iter().any(|m| m.kind == *kind)
            || self.in_flight.iter().any(|s| s.kind == *kind)
    }

    pub fn has_id(&self, id: ModifierId) -> bool {
        self.modifiers.iter().any(|m| m.id == id) || self.in_flight.iter().any(|s| s.id == id)
    }

    pub fn get<M: Modifier>(&self) -> Option<&M> {
        self.modifiers.iter().find_map(|m| m.downcast_ref::<M>())
    }

    pub fn get_mut<M: Modifier>(&mut self) -> Option<&mut M> {
        self.modifiers.iter_mut().find_map(|m| m.downcast_mut::<M>())
    }

    pub fn get_handle(&self, handle: ModifierHandle) -> Option<&ActiveModifier> {
        self.modifiers.iter().find(|m| m.handle() == handle)
    }

    /// True while this collection's hooks are running.
    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// HUD text for the visible modifiers, or `None` when nothing is visible.
    pub fn summary(&self) -> Option<String> {
        let mut visible = self.modifiers.iter().filter(|m| !m.hide_on_ui()).peekable();
        visible.peek()?;

        let mut text = String::from("Modifiers:");
        for active in visible {
            text.push('\n');
            text.push_str(active.name());
            if let Some(timer) = active.timer() {
                let _ = write!(text, " ({:.0}s/{:.0}s)", timer.elapsed(), timer.duration());
            }
        }
        Some(text)
    }

    /// Empties the collection without running hooks.
    pub(crate) fn take_all(&mut self) -> Vec<ActiveModifier> {
        self.pending.clear();
        self.projected.clear();
        mem::take(&mut self.modifiers)
    }

    /// Name of the modifier attached under `id`, counting queued requests while busy.
    fn attached_name(&self, id: ModifierId) -> Option<&str> {
        if self.busy {
            self.projected.iter().find(|s| s.id == id).map(|s| s.name.as_str())
        } else {
            self.modifiers.iter().find(|m| m.id == id).map(|m| m.name())
        }
    }

    fn lock(&mut self, in_flight: &[ActiveModifier]) {
        self.busy = true;
        self.in_flight = in_flight.iter().map(Slot::of).collect();
        self.projected = self
            .modifiers
            .iter()
            .map(Slot::of)
            .chain(self.in_flight.iter().cloned())
            .collect();
    }

    fn unlock(&mut self) {
        self.busy = false;
        self.in_flight.clear();
        self.projected.clear();
    }
}

impl fmt::Debug for ModifierCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModifierCollection")
            .field("modifiers", &self.modifiers)
            .field("in_flight", &self.in_flight.len())
            .field("pending", &self.pending.len())
            .field("busy", &self.busy)
            .finish()
    }
}

/// Which attached modifier a removal addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveTarget {
    Kind(ModifierKind),
    Id(ModifierId),
    Instance(ModifierHandle),
}

impl RemoveTarget {
    fn hits(&self, id: ModifierId, kind: ModifierKind, handle: ModifierHandle) -> bool {
        match self {
            RemoveTarget::Kind(k) => kind == *k,
            RemoveTarget::Id(i) => id == *i,
            RemoveTarget::Instance(h) => handle == *h,
        }
    }

    fn matches(&self, active: &ActiveModifier) -> bool {
        self.hits(active.id, active.kind, active.handle())
    }
}

impl fmt::Display for RemoveTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemoveTarget::Kind(kind) => write!(f, "{kind}"),
            RemoveTarget::Id(id) => write!(f, "#{id}"),
            RemoveTarget::Instance(h) => write!(f, "#{}/{}", h.id, h.instance),
        }
    }
}

enum PendingOp {
    Attach(ActiveModifier),
    Remove(RemoveTarget),
    Clear,
}

// ── World surface ───────────────────────────────────────────────────

/// Add/remove modifiers on an entity's [`ModifierCollection`].
///
/// Every failure is logged here and also returned; the request is then a no-op.
pub trait ModifierWorldExt {
    /// Attach a prepared instance. Its kind must be registered.
    fn add_modifier<M: Modifier>(
        &mut self,
        entity: Entity,
        modifier: M,
    ) -> ModifierResult<ModifierHandle>;

    /// Attach a default instance of `M`.
    fn add_modifier_by_type<M: Modifier>(&mut self, entity: Entity)
    -> ModifierResult<ModifierHandle>;

    fn add_modifier_by_kind(
        &mut self,
        entity: Entity,
        kind: ModifierKind,
    ) -> ModifierResult<ModifierHandle>;

    /// Attach by compact id, as carried in network requests.
    fn add_modifier_by_id(&mut self, entity: Entity, id: ModifierId)
    -> ModifierResult<ModifierHandle>;

    fn remove_modifier<M: Modifier>(&mut self, entity: Entity) -> ModifierResult<()>;

    fn remove_modifier_by_kind(&mut self, entity: Entity, kind: ModifierKind)
    -> ModifierResult<()>;

    fn remove_modifier_by_id(&mut self, entity: Entity, id: ModifierId) -> ModifierResult<()>;

    /// Remove exactly the instance `handle` was issued for.
    fn remove_modifier_instance(&mut self, handle: ModifierHandle) -> ModifierResult<()>;

    /// Deactivate and drop every modifier, in attach order.
    fn clear_modifiers(&mut self, entity: Entity) -> ModifierResult<()>;
}

impl ModifierWorldExt for World {
    fn add_modifier<M: Modifier>(
        &mut self,
        entity: Entity,
        modifier: M,
    ) -> ModifierResult<ModifierHandle> {
        let kind = ModifierKind::of::<M>();
        let result = resolve_id(self, kind)
            .and_then(|id| request_attach(self, entity, id, kind, Box::new(modifier)));
        logged(result)
    }

    fn add_modifier_by_type<M: Modifier>(
        &mut self,
        entity: Entity,
    ) -> ModifierResult<ModifierHandle> {
        self.add_modifier_by_kind(entity, ModifierKind::of::<M>())
    }

    fn add_modifier_by_kind(
        &mut self,
        entity: Entity,
        kind: ModifierKind,
    ) -> ModifierResult<ModifierHandle> {
        let result = resolve_id(self, kind).and_then(|id| construct_and_attach(self, entity, id));
        logged(result)
    }

    fn add_modifier_by_id(
        &mut self,
        entity: Entity,
        id: ModifierId,
    ) -> ModifierResult<ModifierHandle> {
        logged(construct_and_attach(self, entity, id))
    }

    fn remove_modifier<M: Modifier>(&mut self, entity: Entity) -> ModifierResult<()> {
        logged(request_remove(self, entity, RemoveTarget::Kind(ModifierKind::of::<M>())))
    }

    fn remove_modifier_by_kind(
        &mut self,
        entity: Entity,
        kind: ModifierKind,
    ) -> ModifierResult<()> {
        logged(request_remove(self, entity, RemoveTarget::Kind(kind)))
    }

    fn remove_modifier_by_id(&mut self, entity: Entity, id: ModifierId) -> ModifierResult<()> {
        logged(request_remove(self, entity, RemoveTarget::Id(id)))
    }

    fn remove_modifier_instance(&mut self, handle: ModifierHandle) -> ModifierResult<()> {
        logged(request_remove(
            self,
            handle.entity,
            RemoveTarget::Instance(handle),
        ))
    }

    fn clear_modifiers(&mut self, entity: Entity) -> ModifierResult<()> {
        let busy = match self.get_mut::<ModifierCollection>(entity) {
            Some(mut collection) => {
                if collection.busy {
                    collection.projected.clear();
                    collection.pending.push_back(PendingOp::Clear);
                }
                collection.busy
            }
            None => return logged(Err(ModifierError::MissingCollection { entity })),
        };
        if !busy {
            clear_now(self, entity);
        }
        Ok(())
    }
}

/// Deferred versions of [`ModifierWorldExt`] for regular systems.
pub trait ModifierCommandsExt {
    fn add_modifier<M: Modifier>(&mut self, entity: Entity, modifier: M);
    fn add_modifier_by_id(&mut self, entity: Entity, id: ModifierId);
    fn remove_modifier<M: Modifier>(&mut self, entity: Entity);
    fn remove_modifier_instance(&mut self, handle: ModifierHandle);
    fn clear_modifiers(&mut self, entity: Entity);
}

impl ModifierCommandsExt for Commands<'_, '_> {
    fn add_modifier<M: Modifier>(&mut self, entity: Entity, modifier: M) {
        self.queue(move |world: &mut World| {
            let _ = world.add_modifier(entity, modifier);
        });
    }

    fn add_modifier_by_id(&mut self, entity: Entity, id: ModifierId) {
        self.queue(move |world: &mut World| {
            let _ = world.add_modifier_by_id(entity, id);
        });
    }

    fn remove_modifier<M: Modifier>(&mut self, entity: Entity) {
        self.queue(move |world: &mut World| {
            let _ = world.remove_modifier::<M>(entity);
        });
    }

    fn remove_modifier_instance(&mut self, handle: ModifierHandle) {
        self.queue(move |world: &mut World| {
            let _ = world.remove_modifier_instance(handle);
        });
    }

    fn clear_modifiers(&mut self, entity: Entity) {
        self.queue(move |world: &mut World| {
            let _ = world.clear_modifiers(entity);
        });
    }
}

fn logged<T>(result: ModifierResult<T>) -> ModifierResult<T> {
    if let Err(e) = &result {
        warn!("{e}");
    }
    result
}

// ── Request handling ────────────────────────────────────────────────

fn resolve_id(world: &World, kind: ModifierKind) -> ModifierResult<ModifierId> {
    world
        .get_resource::<ModifierRegistry>()
        .and_then(|registry| registry.id_of(&kind))
        .ok_or_else(|| ModifierError::UnregisteredKind {
            kind: kind.name().to_string(),
        })
}

fn construct_and_attach(
    world: &mut World,
    entity: Entity,
    id: ModifierId,
) -> ModifierResult<ModifierHandle> {
    // Dedup before paying for construction.
    ensure_absent(world, entity, id)?;
    let (kind, modifier) = world
        .get_resource::<ModifierRegistry>()
        .ok_or_else(|| ModifierError::UnregisteredKind {
            kind: format!("#{id}"),
        })?
        .construct(id)?;
    request_attach(world, entity, id, kind, modifier)
}

fn ensure_absent(world: &World, entity: Entity, id: ModifierId) -> ModifierResult<()> {
    let collection = world
        .get::<ModifierCollection>(entity)
        .ok_or(ModifierError::MissingCollection { entity })?;
    match collection.attached_name(id) {
        Some(name) => Err(ModifierError::AlreadyActive {
            entity,
            id,
            name: name.to_string(),
        }),
        None => Ok(()),
    }
}

fn request_attach(
    world: &mut World,
    entity: Entity,
    id: ModifierId,
    kind: ModifierKind,
    modifier: Box<dyn Modifier>,
) -> ModifierResult<ModifierHandle> {
    ensure_absent(world, entity, id)?;
    let mut collection = world
        .get_mut::<ModifierCollection>(entity)
        .ok_or(ModifierError::MissingCollection { entity })?;

    let instance = collection.next_instance;
    collection.next_instance += 1;
    let active = ActiveModifier {
        id,
        kind,
        owner: entity,
        instance,
        modifier,
    };
    let handle = active.handle();

    if collection.busy {
        debug!("Queued {kind} for {entity} until its modifiers finish running");
        collection.projected.push(Slot::of(&active));
        collection.pending.push_back(PendingOp::Attach(active));
    } else {
        attach_now(world, active);
    }
    Ok(handle)
}

fn request_remove(world: &mut World, entity: Entity, target: RemoveTarget) -> ModifierResult<()> {
    {
        let mut collection = world
            .get_mut::<ModifierCollection>(entity)
            .ok_or(ModifierError::MissingCollection { entity })?;
        if collection.busy {
            let index = collection
                .projected
                .iter()
                .position(|s| target.hits(s.id, s.kind, s.handle))
                .ok_or_else(|| ModifierError::NotActive {
                    entity,
                    target: target.to_string(),
                })?;
            collection.projected.remove(index);
            collection.pending.push_back(PendingOp::Remove(target));
            return Ok(());
        }
    }
    remove_now(world, entity, target)
}

fn is_local(world: &World, entity: Entity) -> bool {
    world.get::<LocalControl>(entity).is_some()
}

fn lock(world: &mut World, entity: Entity, in_flight: &[ActiveModifier]) {
    if let Some(mut collection) = world.get_mut::<ModifierCollection>(entity) {
        collection.lock(in_flight);
    }
}

fn unlock(world: &mut World, entity: Entity) {
    if let Some(mut collection) = world.get_mut::<ModifierCollection>(entity) {
        collection.unlock();
    }
}

fn run_hook<R>(
    world: &mut World,
    entity: Entity,
    local: bool,
    hook: impl FnOnce(&mut ModifierContext) -> R,
) -> (R, bool) {
    let mut ctx = ModifierContext::new(world, entity, local);
    let out = hook(&mut ctx);
    (out, ctx.removal_requested())
}

fn write_event(world: &mut World, event: ModifierEvent) {
    if let Some(mut messages) = world.get_resource_mut::<Messages<ModifierEvent>>() {
        messages.write(event);
    }
}

fn show_hud(world: &mut World) {
    if let Some(mut hud) = world.get_resource_mut::<ModifierHud>() {
        hud.visible = true;
    }
}

fn attach_now(world: &mut World, mut active: ActiveModifier) {
    let entity = active.owner;
    let local = is_local(world, entity);

    lock(world, entity, std::slice::from_ref(&active));
    let ((), remove) = run_hook(world, entity, local, |ctx| active.modifier.on_activate(ctx));
    if local
        && let Some(timer) = active.modifier.timer_mut()
        && timer.auto_start()
        && let Err(e) = timer.start()
    {
        warn!("Could not start timer of {} on {entity}: {e}", active.name());
    }

    let handle = active.handle();
    let kind = active.kind;
    info!("Added modifier {} to {entity}", active.name());
    match world.get_mut::<ModifierCollection>(entity) {
        Some(mut collection) => {
            collection.unlock();
            collection.modifiers.push(active);
        }
        None => {
            warn!("Entity {entity} lost its modifier collection while activating {kind}");
            deactivate_detached(world, entity, local, vec![active]);
            return;
        }
    }

    write_event(world, ModifierEvent::Added { handle, kind });
    if local {
        show_hud(world);
    }
    if remove {
        let _ = logged(remove_now(world, entity, RemoveTarget::Instance(handle)));
    }
    drain_pending(world, entity);
}

fn remove_now(world: &mut World, entity: Entity, target: RemoveTarget) -> ModifierResult<()> {
    let mut active = {
        let mut collection = world
            .get_mut::<ModifierCollection>(entity)
            .ok_or(ModifierError::MissingCollection { entity })?;
        let index = collection
            .modifiers
            .iter()
            .position(|m| target.matches(m))
            .ok_or_else(|| ModifierError::NotActive {
                entity,
                target: target.to_string(),
            })?;
        let active = collection.modifiers.remove(index);
        collection.lock(&[]);
        active
    };

    let local = is_local(world, entity);
    run_hook(world, entity, local, |ctx| active.modifier.on_deactivate(ctx));
    unlock(world, entity);

    info!("Removed modifier {} from {entity}", active.name());
    write_event(
        world,
        ModifierEvent::Removed {
            handle: active.handle(),
            kind: active.kind,
        },
    );
    if local {
        show_hud(world);
    }
    drain_pending(world, entity);
    Ok(())
}

fn clear_now(world: &mut World, entity: Entity) {
    let modifiers = match world.get_mut::<ModifierCollection>(entity) {
        Some(mut collection) => {
            let modifiers = mem::take(&mut collection.modifiers);
            collection.lock(&[]);
            modifiers
        }
        None => return,
    };
    let local = is_local(world, entity);
    if !modifiers.is_empty() {
        info!("Clearing {} modifiers from {entity}", modifiers.len());
    }
    deactivate_detached(world, entity, local, modifiers);
    unlock(world, entity);
    drain_pending(world, entity);
}

/// Run `on_deactivate` for modifiers that already left their collection.
pub(crate) fn deactivate_detached(
    world: &mut World,
    entity: Entity,
    local: bool,
    modifiers: Vec<ActiveModifier>,
) {
    for mut active in modifiers {
        run_hook(world, entity, local, |ctx| active.modifier.on_deactivate(ctx));
        write_event(
            world,
            ModifierEvent::Removed {
                handle: active.handle(),
                kind: active.kind,
            },
        );
    }
}

fn drain_pending(world: &mut World, entity: Entity) {
    loop {
        let op = {
            let Some(mut collection) = world.get_mut::<ModifierCollection>(entity) else {
                return;
            };
            if collection.busy {
                return;
            }
            let Some(op) = collection.pending.pop_front() else {
                return;
            };
            op
        };

        match op {
            PendingOp::Attach(active) => match ensure_absent(world, entity, active.id) {
                Ok(()) => attach_now(world, active),
                Err(e) => warn!("Dropping queued {}: {e}", active.kind),
            },
            PendingOp::Remove(target) => {
                let _ = logged(remove_now(world, entity, target));
            }
            PendingOp::Clear => clear_now(world, entity),
        }
    }
}

// ── Tick passes ─────────────────────────────────────────────────────

fn begin_pass(world: &mut World, entity: Entity) -> Option<Vec<ActiveModifier>> {
    let mut collection = world.get_mut::<ModifierCollection>(entity)?;
    if collection.busy {
        warn!("Skipping nested modifier pass on {entity}");
        return None;
    }
    let modifiers = mem::take(&mut collection.modifiers);
    collection.lock(&modifiers);
    Some(modifiers)
}

fn end_pass(
    world: &mut World,
    entity: Entity,
    local: bool,
    modifiers: Vec<ActiveModifier>,
    swept: Vec<ModifierHandle>,
) {
    match world.get_mut::<ModifierCollection>(entity) {
        Some(mut collection) => {
            collection.unlock();
            collection.modifiers = modifiers;
        }
        None => {
            // A hook despawned the owner mid-pass.
            deactivate_detached(world, entity, local, modifiers);
            return;
        }
    }
    for handle in swept {
        let _ = logged(remove_now(world, entity, RemoveTarget::Instance(handle)));
    }
    drain_pending(world, entity);
}

/// Detach `handle` at the end of the pass. Queued requests already see it gone.
fn sweep(
    world: &mut World,
    entity: Entity,
    handle: ModifierHandle,
    swept: &mut Vec<ModifierHandle>,
) {
    if let Some(mut collection) = world.get_mut::<ModifierCollection>(entity) {
        collection.projected.retain(|s| s.handle != handle);
    }
    swept.push(handle);
}

fn report_hook_error(entity: Entity, active: &ActiveModifier, result: ModifierResult<()>) {
    if let Err(e) = result {
        error!("Modifier {} on {entity} failed: {e}", active.name());
    }
}

/// One fixed step of every modifier on `entity`, in attach order.
///
/// Timers only advance under local control. A completed timer fires its hook once,
/// and the modifier is detached at the end of the same pass when it asks for it.
pub fn fixed_tick(world: &mut World, entity: Entity, dt: f32) {
    let Some(mut modifiers) = begin_pass(world, entity) else {
        return;
    };
    let local = is_local(world, entity);
    let mut swept = Vec::new();

    for active in modifiers.iter_mut() {
        let (result, mut remove) =
            run_hook(world, entity, local, |ctx| active.modifier.fixed_update(ctx));
        report_hook_error(entity, active, result);

        let completed = local && active.modifier.timer_mut().is_some_and(|t| t.advance(dt));
        if completed {
            let ((), requested) =
                run_hook(world, entity, local, |ctx| active.modifier.on_timer_complete(ctx));
            debug!("Timer of {} on {entity} completed", active.name());
            write_event(
                world,
                ModifierEvent::TimerCompleted {
                    handle: active.handle(),
                    kind: active.kind,
                },
            );
            remove |= requested || active.timer().is_some_and(|t| t.remove_on_complete());
        }

        if remove {
            sweep(world, entity, active.handle(), &mut swept);
        }
    }

    end_pass(world, entity, local, modifiers, swept);
}

/// One frame of every modifier on `entity`, then the HUD refresh for the local entity.
pub fn frame_tick(world: &mut World, entity: Entity) {
    let Some(mut modifiers) = begin_pass(world, entity) else {
        return;
    };
    let local = is_local(world, entity);
    let mut swept = Vec::new();

    for active in modifiers.iter_mut() {
        let (result, remove) = run_hook(world, entity, local, |ctx| active.modifier.update(ctx));
        report_hook_error(entity, active, result);
        if remove {
            sweep(world, entity, active.handle(), &mut swept);
        }
    }

    end_pass(world, entity, local, modifiers, swept);
    if local {
        refresh_hud(world, entity);
    }
}

fn refresh_hud(world: &mut World, entity: Entity) {
    let Some(summary) = world.get::<ModifierCollection>(entity).map(ModifierCollection::summary)
    else {
        return;
    };
    if let Some(mut hud) = world.get_resource_mut::<ModifierHud>() {
        hud.set_summary(summary);
    }
}
