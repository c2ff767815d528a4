// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Browser-side runtime sources

/// Installs the integrity hooks through a DOM adapter
///
/// `installSriRuntime(integrityMap, options, adapter)` where `adapter`
/// provides `pathnameOf(url)`, `wrapAttributeSetter(makeWrapper)` and
/// `wrapInsertionMethod(name, makeWrapper)`. A hook whose installation
/// throws is skipped without affecting the others. Returns the status of
/// every hook: `defined`, `assigned` or `skipped`.
pub const INSTALL_FUNCTION: &str = r#"function installSriRuntime(integrityMap, options, adapter) {
    var PRELOAD_AS = ['script', 'style', 'font'];
    var WATCHED = ['src', 'href', 'rel', 'as'];
    var status = { setAttribute: 'skipped', appendChild: 'skipped', insertBefore: 'skipped', append: 'skipped' };
    var opts = options || {};
    var crossorigin = opts.crossorigin || null;
    var basePath = opts.basePath || null;
    var skip = [];
    var originalSetAttribute = null;

    function escapeRegExp(s) {
        return s.replace(/[.*+?^${}()|[\]\\]/g, '\\$&');
    }

    var patterns = opts.skipResources || [];
    for (var i = 0; i < patterns.length; i++) {
        try {
            var parts = String(patterns[i]).split('*');
            for (var j = 0; j < parts.length; j++) parts[j] = escapeRegExp(parts[j]);
            skip.push(new RegExp('^' + parts.join('.*') + '$'));
        } catch (e) {}
    }

    function has(key) {
        return Object.prototype.hasOwnProperty.call(integrityMap, key);
    }

    function lookup(url) {
        try {
            var pathname = adapter.pathnameOf(String(url));
            if (has(pathname)) return integrityMap[pathname];
            if (basePath && pathname.indexOf(basePath + '/') === 0) {
                var stripped = pathname.slice(basePath.length);
                if (has(stripped)) return integrityMap[stripped];
            }
        } catch (e) {}
        return undefined;
    }

    function attr(el, name) {
        try {
            var value = el.getAttribute(name);
            return value === null || value === undefined ? null : String(value);
        } catch (e) {
            return null;
        }
    }

    function isSkipped(id, url) {
        for (var k = 0; k < skip.length; k++) {
            if ((id && skip[k].test(id)) || (url && skip[k].test(url))) return true;
        }
        return false;
    }

    function resourceUrl(el) {
        if (!el || typeof el.tagName !== 'string' || typeof el.getAttribute !== 'function') return null;
        var tag = el.tagName.toLowerCase();
        if (tag === 'script') return attr(el, 'src');
        if (tag !== 'link') return null;
        var rel = (attr(el, 'rel') || '').toLowerCase().split(/\s+/);
        var as = (attr(el, 'as') || '').toLowerCase();
        var eligible = rel.indexOf('stylesheet') !== -1 ||
            rel.indexOf('modulepreload') !== -1 ||
            (rel.indexOf('preload') !== -1 && PRELOAD_AS.indexOf(as) !== -1);
        return eligible ? attr(el, 'href') : null;
    }

    function setAttr(el, name, value) {
        if (originalSetAttribute) originalSetAttribute.call(el, name, value);
        else el.setAttribute(name, value);
    }

    function apply(el) {
        var url = resourceUrl(el);
        if (!url || attr(el, 'integrity') !== null || isSkipped(attr(el, 'id'), url)) return false;
        var token = lookup(url);
        if (!token) return false;
        try {
            setAttr(el, 'integrity', token);
            if (crossorigin) setAttr(el, 'crossorigin', crossorigin);
            return true;
        } catch (e) {
            return false;
        }
    }

    function beforeInsert(original) {
        return function (child) {
            apply(child);
            return original.apply(this, arguments);
        };
    }

    function hook(install) {
        try {
            var result = install();
            return result === 'defined' || result === 'assigned' ? result : 'skipped';
        } catch (e) {
            return 'skipped';
        }
    }

    status.setAttribute = hook(function () {
        return adapter.wrapAttributeSetter(function (original) {
            originalSetAttribute = original;
            return function (name, value) {
                var result = original.apply(this, arguments);
                if (WATCHED.indexOf(String(name).toLowerCase()) !== -1) apply(this);
                return result;
            };
        });
    });
    status.appendChild = hook(function () {
        return adapter.wrapInsertionMethod('appendChild', beforeInsert);
    });
    status.insertBefore = hook(function () {
        return adapter.wrapInsertionMethod('insertBefore', beforeInsert);
    });
    status.append = hook(function () {
        return adapter.wrapInsertionMethod('append', function (original) {
            return function () {
                for (var n = 0; n < arguments.length; n++) apply(arguments[n]);
                return original.apply(this, arguments);
            };
        });
    });

    return status;
}"#;

/// Adapters installing wrappers on prototypes
///
/// `createPrototypeAdapter(elementProto, nodeProto, pathnameOf)` tries
/// `Object.defineProperty`, then plain assignment, and reports which one
/// took effect. `createDomAdapter()` binds it to the page's DOM.
pub const DOM_ADAPTER: &str = r#"function createPrototypeAdapter(elementProto, nodeProto, pathnameOf) {
    function install(target, name, makeWrapper) {
        if (!target || typeof target[name] !== 'function') return 'skipped';
        var wrapper = makeWrapper(target[name]);
        try {
            Object.defineProperty(target, name, { value: wrapper, writable: true, configurable: true });
            if (target[name] === wrapper) return 'defined';
        } catch (e) {}
        try {
            target[name] = wrapper;
            if (target[name] === wrapper) return 'assigned';
        } catch (e) {}
        return 'skipped';
    }

    return {
        pathnameOf: pathnameOf,
        wrapAttributeSetter: function (makeWrapper) {
            return install(elementProto, 'setAttribute', makeWrapper);
        },
        wrapInsertionMethod: function (name, makeWrapper) {
            return install(name === 'append' ? elementProto : nodeProto, name, makeWrapper);
        }
    };
}

function createDomAdapter() {
    return createPrototypeAdapter(
        typeof Element !== 'undefined' ? Element.prototype : null,
        typeof Node !== 'undefined' ? Node.prototype : null,
        function (url) {
            return new URL(url, location.href).pathname;
        }
    );
}"#;
